//! # Todos
//!
//! `todos` is a small multi-user todo list service: account registration,
//! password login that hands out a bearer token, and per-user CRUD on todo
//! items.
//!
//! ## Credentials
//!
//! Passwords are stored as `salt:derivedKey` records (see [`credential`]),
//! derived with Argon2id under an operator-configured work factor and checked
//! with a constant-time comparison.
//!
//! ## Tokens
//!
//! Login returns an HS256 JWT (see [`token`]) that must be presented as
//! `Authorization: Bearer <token>` or through the `token` cookie. The signing
//! secret has no default.
//!
//! ## Ownership
//!
//! Todos are scoped to their owner. Updating or deleting a todo that does not
//! exist or belongs to someone else returns the same `403` response.

pub mod api;
pub mod cli;
pub mod credential;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
