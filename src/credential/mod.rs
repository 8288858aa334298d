//! Password credential records.
//!
//! A credential record is the only password artifact the service persists:
//!
//! ```text
//! <salt hex, 16 bytes>:<derived key hex, 64 bytes>
//! ```
//!
//! The key is derived with Argon2id. The work factor (memory, iterations,
//! parallelism) is explicit configuration and is not encoded in the record,
//! so every instance reading a shared `users` table must run with the same
//! work factor.

mod error;

pub use error::Error;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 64;

const DELIMITER: char = ':';

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl WorkFactor {
    #[must_use]
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self::new(
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
        )
    }
}

/// Derives and verifies `salt:derivedKey` credential records.
///
/// Stateless apart from its configuration; clone it freely or share it
/// behind an `Arc`.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    work_factor: WorkFactor,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("work_factor", &self.work_factor)
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// # Errors
    /// Returns [`Error::InvalidWorkFactor`] if Argon2 rejects the parameters.
    pub fn new(work_factor: WorkFactor) -> Result<Self, Error> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| Error::InvalidWorkFactor(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            work_factor,
        })
    }

    #[must_use]
    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    /// Derive a new credential record for `plaintext` using a fresh random salt.
    ///
    /// # Errors
    /// Returns [`Error::Randomness`] if the OS random source fails and
    /// [`Error::Derivation`] if Argon2 fails. Both are configuration faults,
    /// not authentication outcomes.
    pub fn derive(&self, plaintext: &str) -> Result<String, Error> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| Error::Randomness(e.to_string()))?;

        let key = self.derive_key(plaintext, &salt)?;

        Ok(format!("{}{DELIMITER}{}", hex::encode(salt), hex::encode(key)))
    }

    /// Check `plaintext` against a stored credential record.
    ///
    /// Anything other than an exact key match is `Ok(false)`, including bad
    /// hex and unusable salts.
    ///
    /// # Errors
    /// Returns [`Error::MalformedRecord`] only when the record has no delimiter.
    pub fn verify(&self, plaintext: &str, record: &str) -> Result<bool, Error> {
        let (salt_hex, key_hex) = record
            .split_once(DELIMITER)
            .ok_or(Error::MalformedRecord)?;

        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
            return Ok(false);
        };

        if expected.len() != KEY_LEN {
            return Ok(false);
        }

        match self.derive_key(plaintext, &salt) {
            Ok(derived) => Ok(bool::from(derived.as_slice().ct_eq(expected.as_slice()))),
            Err(_) => Ok(false),
        }
    }

    fn derive_key(&self, plaintext: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], Error> {
        let mut key = [0u8; KEY_LEN];
        self.argon2
            .hash_password_into(plaintext.as_bytes(), salt, &mut key)
            .map_err(|e| Error::Derivation(e.to_string()))?;
        Ok(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use regex::Regex;

    // Minimum Argon2 cost so the suite stays fast.
    fn hasher() -> CredentialHasher {
        CredentialHasher::new(WorkFactor::new(64, 1, 1)).unwrap()
    }

    #[test]
    fn derive_produces_hex_salt_and_key() {
        let record = hasher().derive("correct-horse").unwrap();
        let re = Regex::new(r"^[0-9a-f]{32}:[0-9a-f]{128}$").unwrap();
        assert!(re.is_match(&record), "unexpected record format: {record}");
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hasher = hasher();
        let record = hasher.derive("correct-horse").unwrap();
        assert_eq!(hasher.verify("correct-horse", &record), Ok(true));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = hasher();
        let record = hasher.derive("correct-horse").unwrap();
        assert_eq!(hasher.verify("wrong-password", &record), Ok(false));
    }

    #[test]
    fn derive_uses_fresh_salt_each_time() {
        let hasher = hasher();
        let first = hasher.derive("same-secret").unwrap();
        let second = hasher.derive("same-secret").unwrap();
        assert_ne!(first, second);
        assert_ne!(first.split(':').next(), second.split(':').next());
        assert_eq!(hasher.verify("same-secret", &first), Ok(true));
        assert_eq!(hasher.verify("same-secret", &second), Ok(true));
    }

    #[test]
    fn verify_without_delimiter_is_malformed() {
        let result = hasher().verify("anything", "deadbeefdeadbeef");
        assert_eq!(result, Err(Error::MalformedRecord));
    }

    #[test]
    fn verify_empty_record_is_malformed() {
        assert_eq!(hasher().verify("anything", ""), Err(Error::MalformedRecord));
    }

    #[test]
    fn verify_fails_closed_on_bad_parts() {
        let hasher = hasher();
        let record = hasher.derive("secret").unwrap();
        let (salt, key) = record.split_once(':').unwrap();

        // non-hex salt
        assert_eq!(hasher.verify("secret", &format!("zz{}:{key}", &salt[2..])), Ok(false));
        // truncated key
        assert_eq!(hasher.verify("secret", &format!("{salt}:{}", &key[..64])), Ok(false));
        // salt too short for argon2
        assert_eq!(hasher.verify("secret", &format!("abcd:{key}")), Ok(false));
        // empty parts
        assert_eq!(hasher.verify("secret", ":"), Ok(false));
    }

    #[test]
    fn verify_splits_on_first_delimiter_only() {
        let hasher = hasher();
        let record = hasher.derive("secret").unwrap();
        assert_eq!(hasher.verify("secret", &format!("{record}:extra")), Ok(false));
    }

    #[test]
    fn records_depend_on_work_factor() {
        let record = hasher().derive("secret").unwrap();
        let stronger = CredentialHasher::new(WorkFactor::new(128, 1, 1)).unwrap();
        assert_eq!(stronger.verify("secret", &record), Ok(false));
    }

    #[test]
    fn invalid_work_factor_is_rejected() {
        let result = CredentialHasher::new(WorkFactor::new(1, 0, 1));
        assert!(matches!(result, Err(Error::InvalidWorkFactor(_))));
    }

    #[test]
    fn default_work_factor_matches_argon2_defaults() {
        let wf = WorkFactor::default();
        assert_eq!(wf, WorkFactor::new(19456, 2, 1));
        assert!(CredentialHasher::new(wf).is_ok());
    }

    #[test]
    fn hasher_is_shareable_across_threads() {
        let hasher = std::sync::Arc::new(hasher());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let hasher = hasher.clone();
                std::thread::spawn(move || {
                    let password = format!("password-{i}");
                    let record = hasher.derive(&password).unwrap();
                    hasher.verify(&password, &record).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
