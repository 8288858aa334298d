use super::{
    error_response, is_unique_violation, normalize_email, storage,
    types::{ErrorBody, UserSummary},
    valid_email, AuthState,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct UserRegister {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    username: String,
}

impl std::fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("email", &self.email)
            .field("password", &"***")
            .field("username", &self.username)
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    message: String,
    user: UserSummary,
}

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = UserRegister,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse, content_type = "application/json"),
        (status = 400, description = "Missing fields, invalid email or user already exists", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state))]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UserRegister>>,
) -> Response {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    debug!("user: {:?}", user);

    let email = normalize_email(&user.email);
    let username = user.username.trim().to_string();

    if email.is_empty() || user.password.is_empty() || username.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "All fields are required.");
    }

    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email.");
    }

    match storage::user_exists(&pool, &email).await {
        Ok(true) => {
            debug!("User already exists");
            return error_response(StatusCode::BAD_REQUEST, "User already exists.");
        }
        Ok(false) => (),
        Err(e) => {
            error!("Error checking if user exists: {:?}", e);
            return internal_error();
        }
    }

    let hasher = auth_state.hasher().clone();
    let password = user.password;
    let record = match tokio::task::spawn_blocking(move || hasher.derive(&password)).await {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => {
            error!("Error deriving credential record: {e}");
            return internal_error();
        }
        Err(e) => {
            error!("Credential derivation task failed: {e}");
            return internal_error();
        }
    };

    match storage::insert_user(&pool, &email, &username, &record).await {
        Ok(summary) => {
            info!(user_id = %summary.id, "User registered");
            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "User registered successfully.".to_string(),
                    user: summary,
                }),
            )
                .into_response()
        }
        Err(e) if is_unique_violation(&e) => {
            debug!("User created concurrently");
            error_response(StatusCode::BAD_REQUEST, "User already exists.")
        }
        Err(e) => {
            error!("Error inserting user: {:?}", e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}
