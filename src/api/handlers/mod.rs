pub mod guard;
pub mod health;
#[cfg(test)]
mod integration_tests;
pub mod pages;
pub mod principal;
pub mod session;
pub(crate) mod state;
mod storage;
pub mod todos;
pub mod types;
pub mod user_login;
pub mod user_register;

pub use self::guard::page_guard;
pub use self::health::health;
pub use self::session::logout;
pub use self::state::AuthState;
pub use self::todos::{create_todo, delete_todo, list_todos, update_todo};
pub use self::user_login::login;
pub use self::user_register::register;

// common functions for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;

/// JSON error body shared by every API handler: `{"error": "..."}`.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
