//! Shared auth state: credential hasher, token issuer, cookie settings.

use crate::{
    credential::{self, CredentialHasher},
    token::TokenIssuer,
};

// Password used to build the dummy record checked when an email is unknown,
// so missing accounts cost the same Argon2 run as wrong passwords.
const DUMMY_PASSWORD: &str = "todos-dummy-password";

#[derive(Clone, Debug)]
pub struct AuthState {
    hasher: CredentialHasher,
    tokens: TokenIssuer,
    cookie_secure: bool,
    dummy_record: String,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the dummy credential record cannot be derived.
    pub fn new(hasher: CredentialHasher, tokens: TokenIssuer) -> Result<Self, credential::Error> {
        let dummy_record = hasher.derive(DUMMY_PASSWORD)?;
        Ok(Self {
            hasher,
            tokens,
            cookie_secure: false,
            dummy_record,
        })
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub(super) fn dummy_record(&self) -> &str {
        &self.dummy_record
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    use super::AuthState;
    use crate::credential::{CredentialHasher, WorkFactor};
    use crate::token::TokenIssuer;
    use secrecy::SecretString;
    use std::sync::Arc;

    pub(crate) const TEST_SECRET: &str = "test-signing-secret";

    pub(crate) fn auth_state() -> Arc<AuthState> {
        let hasher = CredentialHasher::new(WorkFactor::new(64, 1, 1)).unwrap();
        let tokens = TokenIssuer::new(SecretString::from(TEST_SECRET.to_string()), 3600).unwrap();
        Arc::new(AuthState::new(hasher, tokens).unwrap())
    }
}
