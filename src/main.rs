mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use config::Config;
use db::todo_repository::TodoRepository;
use db::user_repository::UserRepository;
use db::Database;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use utils::token::TokenService;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::todos::list_todos,
        handlers::todos::create_todo,
        handlers::todos::get_todo,
        handlers::todos::update_todo,
        handlers::todos::delete_todo,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::health::HealthChecks,
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::AuthResponse,
            handlers::auth::UserResponse,
            handlers::todos::CreateTodoRequest,
            handlers::todos::DeleteTodoResponse,
            models::todo::Todo,
            models::todo::TodoPatch,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "User registration and login"),
        (name = "Todos", description = "Owner-scoped todo endpoints requiring JWT authentication")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

/// Built client assets with a fallback to `index.html` for client-side routes.
///
/// Unknown `/api` paths are not client routes and get a JSON 404 instead.
fn static_files(dir: PathBuf) -> Files {
    let index = dir.join("index.html");

    Files::new("/", dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                if req.path() == "/api" || req.path().starts_with("/api/") {
                    let res = HttpResponse::NotFound()
                        .json(serde_json::json!({ "error": "Not found" }));
                    return Ok(ServiceResponse::new(req, res));
                }
                let file = NamedFile::open_async(&index).await?;
                let res = file.into_response(&req);
                Ok(ServiceResponse::new(req, res))
            }
        }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json()
        .init();

    // Store failures at startup are fatal
    let database = Database::new(&config.db_path).map_err(|e| {
        error!(db_path = %config.db_path, error = %e, "Failed to open database");
        std::io::Error::other(e)
    })?;
    info!(db_path = %config.db_path, "Database initialized");

    if config.uses_default_secret() {
        warn!("JWT_SECRET not set, using the development default");
    }

    let tokens = web::Data::new(TokenService::new(&config.jwt_secret, config.token_ttl));
    let users = web::Data::new(UserRepository::new(database.clone()));
    let todos = web::Data::new(TodoRepository::new(database.clone()));
    let database = web::Data::new(database);
    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let config = web::Data::new(config);

    info!(bind_address = %bind_address, "Starting todo API server");
    info!("Available endpoints:");
    info!("   GET    /api/health         - Health check (public)");
    info!("   POST   /api/auth/register  - Register new user (public)");
    info!("   POST   /api/auth/login     - Login user (public)");
    info!("   GET    /api/todos          - List todos (protected)");
    info!("   POST   /api/todos          - Create todo (protected)");
    info!("   GET    /api/todos/{{id}}     - Get todo (protected)");
    info!("   PATCH  /api/todos/{{id}}     - Update todo (protected)");
    info!("   DELETE /api/todos/{{id}}     - Delete todo (protected)");
    info!(
        swagger_url = format!("http://{}/swagger-ui/", bind_address),
        "Swagger UI available"
    );
    if let Some(dir) = &static_dir {
        info!(static_dir = %dir.display(), "Serving client assets");
    }

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        let mut app = App::new()
            .app_data(config.clone())
            .app_data(database.clone())
            .app_data(tokens.clone())
            .app_data(users.clone())
            .app_data(todos.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .configure(routes::configure);

        // Registered last so it only sees paths nothing else claimed
        if let Some(dir) = &static_dir {
            app = app.service(static_files(dir.clone()));
        }

        app
    })
    .bind(&bind_address)?
    .run()
    .await
}
