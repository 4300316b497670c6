use crate::config::Config;
use crate::db::todo_repository::TodoRepository;
use crate::db::user_repository::UserRepository;
use crate::db::Database;
use crate::routes;
use crate::utils::token::TokenService;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};

/// Fresh in-memory app state shared between a test and its service.
pub struct TestState {
    pub config: web::Data<Config>,
    pub database: web::Data<Database>,
    pub users: web::Data<UserRepository>,
    pub todos: web::Data<TodoRepository>,
    pub tokens: web::Data<TokenService>,
}

impl TestState {
    pub fn new() -> Self {
        Self::with_secret("test-secret-key")
    }

    pub fn with_secret(secret: &str) -> Self {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.jwt_secret = secret.to_string();

        let database = Database::in_memory().unwrap();
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);

        TestState {
            config: web::Data::new(config),
            users: web::Data::new(UserRepository::new(database.clone())),
            todos: web::Data::new(TodoRepository::new(database.clone())),
            database: web::Data::new(database),
            tokens: web::Data::new(tokens),
        }
    }

    /// Register `username` and return a token for them
    pub async fn login(&self, username: &str) -> String {
        let user = self.users.register(username, "password").await.unwrap();
        self.tokens.issue(&user.id).unwrap()
    }
}

pub fn test_app(
    state: &TestState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state.config.clone())
        .app_data(state.database.clone())
        .app_data(state.users.clone())
        .app_data(state.todos.clone())
        .app_data(state.tokens.clone())
        .configure(routes::configure)
}
