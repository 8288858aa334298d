//! Redirect guard for HTML pages.
//!
//! Only the page router is wrapped; `/api/*`, `/health` and the docs are
//! never redirected. The guard reads the `token` cookie, the same one set by
//! `/api/login`.

use super::{principal::extract_cookie_token, AuthState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

const PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/register"];
const HOME: &str = "/";
const DASHBOARD: &str = "/dashboard";

#[must_use]
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Where a page request should be sent instead, if anywhere.
#[must_use]
pub fn redirect_target(path: &str, authenticated: bool) -> Option<&'static str> {
    match (is_public_path(path), authenticated) {
        (true, true) => Some(DASHBOARD),
        (false, false) => Some(HOME),
        _ => None,
    }
}

pub async fn page_guard(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let authenticated = extract_cookie_token(request.headers())
        .is_some_and(|token| auth_state.tokens().verify(&token).is_ok());

    if let Some(target) = redirect_target(request.uri().path(), authenticated) {
        debug!(path = request.uri().path(), to = target, "Redirecting page request");
        return Redirect::temporary(target).into_response();
    }

    next.run(request).await
}
