//! Error types for the counter cache.

use thiserror::Error;

/// Counter cache errors. The limiter never surfaces these to clients;
/// they select the degraded path.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis returned an error or the connection dropped.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Round trip exceeded the configured timeout.
    #[error("cache operation timed out")]
    Timeout,

    /// Cache is unreachable.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// Window length is not representable.
    #[error("invalid window: {0:?}")]
    InvalidWindow(std::time::Duration),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
