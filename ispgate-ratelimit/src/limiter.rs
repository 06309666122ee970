use crate::CounterStore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of every counter key in the shared cache.
pub const KEY_PREFIX: &str = "ratelimit:";

/// What to do when the counter cache cannot answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Allow the request.
    #[default]
    Open,
    /// Reject the request for a full window.
    Closed,
}

impl FailureMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown failure mode '{other}', expected open or closed")),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Rejected { retry_after_secs: u64 },
}

impl RateDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Fixed-window rate limiter.
///
/// Holds no counters itself. A limiter built without a store (cache
/// unreachable at startup) applies its failure mode to every check.
#[derive(Clone)]
pub struct RateLimiter {
    store: Option<Arc<dyn CounterStore>>,
    failure_mode: FailureMode,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("has_store", &self.store.is_some())
            .field("failure_mode", &self.failure_mode)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, failure_mode: FailureMode) -> Self {
        Self {
            store: Some(store),
            failure_mode,
        }
    }

    /// A limiter with no cache behind it.
    pub fn without_store(failure_mode: FailureMode) -> Self {
        Self {
            store: None,
            failure_mode,
        }
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Counts one request from `client` against `limit` per `window`.
    pub async fn check(&self, client: &str, limit: u64, window: Duration) -> RateDecision {
        let Some(store) = &self.store else {
            return self.degraded(window);
        };
        let key = format!("{KEY_PREFIX}{client}");
        match try_check(store.as_ref(), &key, limit, window).await {
            Ok(decision) => {
                if let RateDecision::Rejected { retry_after_secs } = decision {
                    debug!("Rate limit exceeded for {} (retry in {}s)", client, retry_after_secs);
                }
                decision
            }
            Err(e) => {
                warn!("Rate limiter cache error, failing {}: {}", self.failure_mode, e);
                self.degraded(window)
            }
        }
    }

    fn degraded(&self, window: Duration) -> RateDecision {
        match self.failure_mode {
            FailureMode::Open => RateDecision::Allowed,
            FailureMode::Closed => RateDecision::Rejected {
                retry_after_secs: ceil_secs(window),
            },
        }
    }
}

async fn try_check(
    store: &dyn CounterStore,
    key: &str,
    limit: u64,
    window: Duration,
) -> crate::CacheResult<RateDecision> {
    let count = store.count(key).await?.unwrap_or(0);
    if count >= limit {
        let remaining = store.ttl(key).await?.unwrap_or(window);
        return Ok(RateDecision::Rejected {
            retry_after_secs: ceil_secs(remaining),
        });
    }
    store.increment(key, window).await?;
    Ok(RateDecision::Allowed)
}

/// Whole seconds rounded up, never less than one.
fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}
