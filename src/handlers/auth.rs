use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::user::User;
use crate::utils::token::TokenService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
}

fn auth_response(tokens: &TokenService, user: User) -> Result<AuthResponse, AppError> {
    let token = tokens.issue(&user.id).map_err(|e| {
        error!(error = %e, user_id = %user.id, "Failed to generate JWT");
        AppError::Internal("Failed to generate token".to_string())
    })?;

    Ok(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            username: user.username,
        },
    })
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Authentication"
)]
pub async fn register(
    user_repo: web::Data<UserRepository>,
    tokens: web::Data<TokenService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    info!(username = %payload.username, "Registration attempt");

    let user = user_repo
        .register(&payload.username, &payload.password)
        .await
        .inspect_err(|e| warn!(username = %payload.username, reason = %e, "Registration failed"))?;

    info!(user_id = %user.id, username = %user.username, "User registered successfully");

    Ok(HttpResponse::Created().json(auth_response(&tokens, user)?))
}

/// Login an existing user
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    user_repo: web::Data<UserRepository>,
    tokens: web::Data<TokenService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    info!(username = %payload.username, "Login attempt");

    let user = user_repo
        .verify_credentials(&payload.username, &payload.password)
        .await
        .inspect_err(|e| warn!(username = %payload.username, reason = %e, "Login failed"))?;

    info!(username = %user.username, user_id = %user.id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(auth_response(&tokens, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_app, TestState};
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn test_register_returns_token_and_user() {
        let state = TestState::new();
        let app = test::init_service(test_app(&state)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({ "username": "alice", "password": "pw123456" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let body: AuthResponse = test::read_body_json(res).await;
        assert_eq!(body.user.username, "alice");
        assert_eq!(state.tokens.verify(&body.token).unwrap(), body.user.id);
    }

    #[actix_web::test]
    async fn test_register_twice_conflicts() {
        let state = TestState::new();
        let app = test::init_service(test_app(&state)).await;

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(serde_json::json!({ "username": "bob", "password": "pw" }))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_register_rejects_bad_bodies() {
        let state = TestState::new();
        let app = test::init_service(test_app(&state)).await;

        let empty = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({ "username": "", "password": "pw" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, empty).await.status(),
            StatusCode::BAD_REQUEST
        );

        let missing = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({ "username": "carol" }))
            .to_request();
        let res = test::call_service(&app, missing).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_login() {
        let state = TestState::new();
        state.users.register("dave", "s3cret!").await.unwrap();
        let app = test::init_service(test_app(&state)).await;

        let ok = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "username": "dave", "password": "s3cret!" }))
            .to_request();
        let res = test::call_service(&app, ok).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: AuthResponse = test::read_body_json(res).await;
        assert_eq!(body.user.username, "dave");

        let wrong = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "username": "dave", "password": "nope" }))
            .to_request();
        let res = test::call_service(&app, wrong).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let wrong_body: serde_json::Value = test::read_body_json(res).await;

        let unknown = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "username": "nobody", "password": "s3cret!" }))
            .to_request();
        let res = test::call_service(&app, unknown).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let unknown_body: serde_json::Value = test::read_body_json(res).await;

        assert_eq!(wrong_body, unknown_body);
    }
}
