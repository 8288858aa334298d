//! Todo CRUD, scoped to the authenticated user.

use super::{
    error_response, message_response,
    principal::require_auth,
    storage,
    types::{ErrorBody, MessageBody, Todo},
    AuthState,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_OWNED: &str = "Unauthorized or Todo not found";

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateTodo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateTodo {
    id: Uuid,
    title: Option<String>,
    content: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct DeleteTodo {
    id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/todo",
    responses(
        (status = 200, description = "Todos owned by the caller", body = [Todo]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "todo"
)]
#[instrument(skip_all)]
pub async fn list_todos(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match storage::list_todos(&pool, principal.user_id).await {
        Ok(todos) => (StatusCode::OK, Json(todos)).into_response(),
        Err(e) => {
            error!("Error listing todos: {:?}", e);
            internal_error()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/todo",
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Missing payload or title", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "todo"
)]
#[instrument(skip(headers, pool, auth_state))]
pub async fn create_todo(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateTodo>>,
) -> Response {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let Some(Json(todo)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let title = todo.title.trim();
    if title.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Title is required.");
    }

    match storage::insert_todo(&pool, principal.user_id, title, &todo.content).await {
        Ok(created) => {
            debug!(todo_id = %created.id, "Todo created");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(e) => {
            error!("Error creating todo: {:?}", e);
            internal_error()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/todo",
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, description = "Missing payload or empty title", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Todo missing or owned by another user", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "todo"
)]
#[instrument(skip(headers, pool, auth_state))]
pub async fn update_todo(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateTodo>>,
) -> Response {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let Some(Json(todo)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let title = todo.title.as_deref().map(str::trim);
    if title.is_some_and(str::is_empty) {
        return error_response(StatusCode::BAD_REQUEST, "Title is required.");
    }

    match storage::update_todo(
        &pool,
        principal.user_id,
        todo.id,
        title,
        todo.content.as_deref(),
    )
    .await
    {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => error_response(StatusCode::FORBIDDEN, NOT_OWNED),
        Err(e) => {
            error!("Error updating todo: {:?}", e);
            internal_error()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/todo",
    request_body = DeleteTodo,
    responses(
        (status = 200, description = "Todo deleted", body = MessageBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Todo missing or owned by another user", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "todo"
)]
#[instrument(skip(headers, pool, auth_state))]
pub async fn delete_todo(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<DeleteTodo>>,
) -> Response {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let Some(Json(todo)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    match storage::delete_todo(&pool, principal.user_id, todo.id).await {
        Ok(true) => message_response(StatusCode::OK, "Todo deleted successfully"),
        Ok(false) => error_response(StatusCode::FORBIDDEN, NOT_OWNED),
        Err(e) => {
            error!("Error deleting todo: {:?}", e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}
