//! Token cookie helpers and the logout endpoint.

use super::{message_response, types::MessageBody, AuthState};
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    response::Response,
};
use std::sync::Arc;
use tracing::error;

pub const TOKEN_COOKIE_NAME: &str = "token";

/// Build the `HttpOnly` cookie carrying the login token.
pub(super) fn token_cookie(
    auth_state: &AuthState,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_state.tokens().ttl_seconds();
    let mut cookie = format!(
        "{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if auth_state.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_token_cookie(auth_state: &AuthState) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if auth_state.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Token cookie cleared", body = MessageBody),
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> Response {
    let mut response = message_response(StatusCode::OK, "Logged out.");
    // Always clear the cookie, the token itself stays valid until it expires.
    match clear_token_cookie(&auth_state) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(e) => error!("Failed to build logout cookie: {e}"),
    }
    response
}
