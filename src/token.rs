//! Bearer tokens handed out on login.
//!
//! Tokens are HS256 JWTs signed with an injected secret. There is no default
//! secret: the server refuses to start without one. Every token carries an
//! `exp` claim derived from the configured TTL.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum Error {
    #[error("token signing secret is empty")]
    MissingSecret,
    #[error("failed to encode token")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("invalid subject in token")]
    InvalidSubject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// # Errors
    /// Returns [`Error::InvalidSubject`] if `sub` is not a UUID.
    pub fn user_id(&self) -> Result<Uuid, Error> {
        Uuid::parse_str(&self.sub).map_err(|_| Error::InvalidSubject)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenIssuer {
    /// # Errors
    /// Returns [`Error::MissingSecret`] if the secret is empty or whitespace.
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Result<Self, Error> {
        if secret.expose_secret().trim().is_empty() {
            return Err(Error::MissingSecret);
        }
        Ok(Self {
            secret,
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a token for the given user, valid for the configured TTL.
    ///
    /// # Errors
    /// Returns [`Error::Encode`] if signing fails.
    pub fn issue(&self, user_id: Uuid, email: &str, username: &str) -> Result<String, Error> {
        self.issue_at(user_id, email, username, now_unix_seconds())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        username: &str,
        now: i64,
    ) -> Result<String, Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(Error::Encode)
    }

    /// Check signature and expiry, returning the decoded claims.
    ///
    /// # Errors
    /// Returns [`Error::Expired`] for expired tokens and [`Error::Invalid`] for
    /// anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::Expired,
                _ => Error::Invalid(e),
            })
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
