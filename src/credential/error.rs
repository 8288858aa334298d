use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("malformed credential record")]
    MalformedRecord,
    #[error("invalid work factor: {0}")]
    InvalidWorkFactor(String),
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("secure random source unavailable: {0}")]
    Randomness(String),
}
