//! Authenticated principal extraction.
//!
//! Flow Overview: read the bearer token (or the `token` cookie), verify it,
//! and return a principal that downstream handlers scope their queries to.

use super::{error_response, session::TOKEN_COOKIE_NAME, AuthState};
use axum::{
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, StatusCode,
    },
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

/// Authenticated user context derived from a verified token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

/// Resolve the request token into a principal, or return a 401 response.
pub fn require_auth(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, Response> {
    authenticate(headers, auth_state)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

/// Same as [`require_auth`] but without building a response.
pub(crate) fn authenticate(headers: &HeaderMap, auth_state: &AuthState) -> Option<Principal> {
    let token = extract_token(headers)?;
    match auth_state.tokens().verify(&token) {
        Ok(claims) => {
            let user_id = claims.user_id().ok()?;
            Some(Principal {
                user_id,
                email: claims.email,
                username: claims.username,
            })
        }
        Err(e) => {
            debug!("Rejected token: {e}");
            None
        }
    }
}

/// Bearer header wins over the cookie.
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie_token(headers)
}

pub(crate) fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == TOKEN_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
