use super::{
    error_response, normalize_email,
    session::token_cookie,
    storage::{self, UserRecord},
    types::ErrorBody,
    AuthState,
};
use crate::credential;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct UserLogin {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl std::fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    message: String,
    token: String,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = UserLogin,
    responses(
        (status = 200, description = "Login successful, token returned and set as cookie", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Email and password are required", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state))]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UserLogin>>,
) -> Response {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    debug!("user: {:?}", user);

    let email = normalize_email(&user.email);
    if email.is_empty() || user.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Email and password are required.");
    }

    let stored = match storage::find_user_by_email(&pool, &email).await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Error getting user from database: {:?}", e);
            return internal_error();
        }
    };

    // Unknown accounts still pay for one derivation against the dummy record.
    let record = stored
        .as_ref()
        .map_or_else(|| auth_state.dummy_record().to_string(), |u| u.password.clone());

    let hasher = auth_state.hasher().clone();
    let password = user.password;
    let verified = match tokio::task::spawn_blocking(move || hasher.verify(&password, &record)).await
    {
        Ok(result) => result,
        Err(e) => {
            error!("Credential verification task failed: {e}");
            return internal_error();
        }
    };

    let account: UserRecord = match (stored, verified) {
        (Some(account), Ok(true)) => account,
        (Some(account), Err(credential::Error::MalformedRecord)) => {
            error!(user_id = %account.id, "Stored credential record is malformed");
            return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
        (Some(_), Err(e)) => {
            error!("Error verifying credential: {e}");
            return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
        (Some(_), Ok(false)) => {
            debug!("Wrong password");
            return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
        (None, _) => {
            debug!("User not found");
            return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
    };

    let token = match auth_state
        .tokens()
        .issue(account.id, &account.email, &account.username)
    {
        Ok(token) => token,
        Err(e) => {
            error!("Error issuing token: {e}");
            return internal_error();
        }
    };

    let mut response = (
        StatusCode::OK,
        Json(LoginResponse {
            message: "Login successful.".to_string(),
            token: token.clone(),
        }),
    )
        .into_response();

    match token_cookie(&auth_state, &token) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(e) => warn!("Failed to build token cookie: {e}"),
    }

    debug!(user_id = %account.id, "Login successful");

    response
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}
