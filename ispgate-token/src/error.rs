//! Error types for token issuance and verification.

use thiserror::Error;

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Token errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed structure, or expired. Deliberately opaque.
    #[error("invalid token")]
    Invalid,

    /// Authentic and unexpired, but the payload is not the expected claim shape.
    #[error("invalid token claims")]
    InvalidClaims,

    /// No signing secret configured outside development mode.
    #[error("signing secret is not configured")]
    MissingSecret,

    /// Encoding the token failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}
