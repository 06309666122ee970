//! Request rate limiting for the gateway.
//!
//! A fixed-window counter per client lives in a shared cache so every
//! gateway process enforces the same quota. Each check reads the current
//! count; at or above the limit the request is rejected with the window's
//! remaining time, otherwise the counter is incremented in one pipelined
//! round trip that also anchors the window expiry on its first increment.
//!
//! Concurrent checks racing at a window boundary may overcount slightly.
//! The limiter is an abuse guard, not a billing quota.
//!
//! When the cache is missing or failing, the configured [`FailureMode`]
//! decides the outcome.

mod client;
mod error;
mod limiter;
mod memory;
mod redis_store;

pub use client::TrustedProxies;
pub use error::{CacheError, CacheResult};
pub use limiter::{FailureMode, RateDecision, RateLimiter, KEY_PREFIX};
pub use memory::MemoryCounterStore;
pub use redis_store::{RedisCounterStore, DEFAULT_CACHE_TIMEOUT};

use async_trait::async_trait;
use std::time::Duration;

/// Shared counter cache.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current count under `key`, or `None` if no window is open.
    async fn count(&self, key: &str) -> CacheResult<Option<u64>>;

    /// Time left in the window under `key`.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Increments the counter under `key` and returns the new count. The
    /// expiry is set to `window` only if the key has none yet.
    async fn increment(&self, key: &str, window: Duration) -> CacheResult<u64>;
}
