//! Redis-backed counter cache shared by every gateway process.

use crate::error::{CacheError, CacheResult};
use crate::CounterStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Default bound on a single cache round trip.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Counter cache on a Redis server.
///
/// A window is opened by `SET key 0 EX <window> NX` and counted with `INCR`,
/// which keeps the existing expiry. Both run in one `MULTI` block.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connects to `url`, giving up after `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout)??;
        info!("Connected to rate-limit cache");
        Ok(Self { conn, timeout })
    }

    async fn bounded<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn count(&self, key: &str) -> CacheResult<Option<u64>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.bounded(async move { cmd.query_async(&mut conn).await })
            .await
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("PTTL");
        cmd.arg(key);
        let millis: i64 = self
            .bounded(async move { cmd.query_async(&mut conn).await })
            .await?;
        // -2: no such key, -1: no expiry.
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    async fn increment(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let secs = window.as_secs().max(1);
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(secs)
            .arg("NX")
            .ignore()
            .cmd("INCR")
            .arg(key);
        let (count,): (u64,) = self
            .bounded(async move { pipe.query_async(&mut conn).await })
            .await?;
        Ok(count)
    }
}
