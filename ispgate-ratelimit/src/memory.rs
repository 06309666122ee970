//! In-process counter cache.

use crate::error::{CacheError, CacheResult};
use crate::CounterStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ispgate_types::Clock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Clock time between sweeps of expired windows.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Table {
    windows: HashMap<String, Window>,
    next_sweep: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    expires_at: DateTime<Utc>,
}

/// Counter cache held in memory, with expiry driven by a [`Clock`].
///
/// Only suitable for a single process or for tests. Can be switched
/// offline to exercise the limiter's degraded path.
#[derive(Debug)]
pub struct MemoryCounterStore {
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(Table {
                windows: HashMap::new(),
                next_sweep: DateTime::<Utc>::MIN_UTC,
            }),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of windows currently held, expired or not.
    pub fn tracked_keys(&self) -> usize {
        self.table.lock().map(|t| t.windows.len()).unwrap_or(0)
    }

    /// Locks the table and drops `key` if its window has passed. Every
    /// [`SWEEP_INTERVAL`] the whole table is swept, so keys that are never
    /// read again do not stay resident.
    fn live(&self, key: &str) -> CacheResult<(MutexGuard<'_, Table>, DateTime<Utc>)> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache offline".into()));
        }
        let mut table = self
            .table
            .lock()
            .map_err(|_| CacheError::Unavailable("counter lock poisoned".into()))?;
        let now = self.clock.now();
        if now >= table.next_sweep {
            table.windows.retain(|_, w| now < w.expires_at);
            table.next_sweep = now + chrono::Duration::seconds(SWEEP_INTERVAL.as_secs() as i64);
        } else if table.windows.get(key).is_some_and(|w| now >= w.expires_at) {
            table.windows.remove(key);
        }
        Ok((table, now))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn count(&self, key: &str) -> CacheResult<Option<u64>> {
        let (table, _) = self.live(key)?;
        Ok(table.windows.get(key).map(|w| w.count))
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let (table, now) = self.live(key)?;
        Ok(table
            .windows
            .get(key)
            .and_then(|w| (w.expires_at - now).to_std().ok()))
    }

    async fn increment(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let span =
            chrono::Duration::from_std(window).map_err(|_| CacheError::InvalidWindow(window))?;
        let (mut table, now) = self.live(key)?;
        let entry = table.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + span,
        });
        entry.count += 1;
        Ok(entry.count)
    }
}
