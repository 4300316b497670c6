use crate::db::todo_repository::TodoRepository;
use crate::error::AppError;
use crate::models::todo::{Todo, TodoPatch};
use crate::models::user::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    pub title: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DeleteTodoResponse {
    pub message: String,
    pub id: String,
}

/// List the caller's todos, newest first
#[utoipa::path(
    get,
    path = "/api/todos",
    responses(
        (status = 200, description = "Todos owned by the caller", body = [Todo]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn list_todos(
    user: web::ReqData<AuthenticatedUser>,
    todo_repo: web::Data<TodoRepository>,
) -> Result<HttpResponse, AppError> {
    let todos = todo_repo.list_by_owner(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(todos))
}

/// Create a todo owned by the caller
#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn create_todo(
    user: web::ReqData<AuthenticatedUser>,
    todo_repo: web::Data<TodoRepository>,
    payload: web::Json<CreateTodoRequest>,
) -> Result<HttpResponse, AppError> {
    let todo = todo_repo.create(&user.user_id, &payload.title).await?;
    Ok(HttpResponse::Created().json(todo))
}

/// Fetch one of the caller's todos
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo id")
    ),
    responses(
        (status = 200, description = "Todo found", body = Todo),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Todo not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn get_todo(
    user: web::ReqData<AuthenticatedUser>,
    todo_repo: web::Data<TodoRepository>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let todo = todo_repo.find_by_id_and_owner(&id, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Partially update one of the caller's todos
#[utoipa::path(
    patch,
    path = "/api/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo id")
    ),
    request_body = TodoPatch,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Todo not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn update_todo(
    user: web::ReqData<AuthenticatedUser>,
    todo_repo: web::Data<TodoRepository>,
    id: web::Path<String>,
    payload: web::Json<TodoPatch>,
) -> Result<HttpResponse, AppError> {
    let todo = todo_repo
        .update(&id, &user.user_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Delete one of the caller's todos
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo id")
    ),
    responses(
        (status = 200, description = "Todo deleted", body = DeleteTodoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Todo not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Todos"
)]
pub async fn delete_todo(
    user: web::ReqData<AuthenticatedUser>,
    todo_repo: web::Data<TodoRepository>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    todo_repo.delete(&id, &user.user_id).await?;

    info!(user_id = %user.user_id, todo_id = %id, "User deleted todo");

    Ok(HttpResponse::Ok().json(DeleteTodoResponse {
        message: "Todo deleted".to_string(),
        id: id.into_inner(),
    }))
}
