//! Error types for password handling.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while hashing or verifying passwords.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The digest was not produced by this hasher.
    #[error("malformed password digest")]
    MalformedDigest,

    /// Hashing failed (bad parameters or entropy source failure).
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
