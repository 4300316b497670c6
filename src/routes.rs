use crate::error::AppError;
use crate::handlers;
use crate::middleware::auth::AuthMiddleware;
use actix_web::{error::JsonPayloadError, web, HttpRequest};
use tracing::warn;

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = %req.path(), error = %err, "Rejected request body");
    AppError::InvalidInput(format!("Invalid request body: {}", err)).into()
}

/// All `/api` routes.
///
/// Per protected request the interceptors run in order: `AuthMiddleware`
/// on the scope, then JSON body validation in the extractor, then the
/// handler. Expects `Config`, `Database`, `UserRepository`, `TodoRepository`
/// and `TokenService` to be registered as `web::Data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/api/health", web::get().to(handlers::health::health))
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/login", web::post().to(handlers::auth::login)),
        )
        .service(
            web::scope("/api/todos")
                .wrap(AuthMiddleware)
                .route("", web::get().to(handlers::todos::list_todos))
                .route("", web::post().to(handlers::todos::create_todo))
                .route("/{id}", web::get().to(handlers::todos::get_todo))
                .route("/{id}", web::patch().to(handlers::todos::update_todo))
                .route("/{id}", web::delete().to(handlers::todos::delete_todo)),
        );
}
