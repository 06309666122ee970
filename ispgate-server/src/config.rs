//! Gateway configuration.
//!
//! Every option resolves from a flag or an environment variable once at
//! startup. [`Settings`] carries the validated values and every default the
//! routes fall back on.

use clap::Args;
use ispgate_crypto::{HashParams, PasswordPolicy};
use ispgate_license::LicenseDefaults;
use ispgate_ratelimit::{FailureMode, TrustedProxies};
use ispgate_token::{SigningSecret, TokenResult, SESSION_TTL_HOURS};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive")]
    NotPositive { name: &'static str },

    #[error("--default-modules must name at least one module")]
    NoModules,
}

/// Command-line and environment options for `ispgate serve`.
#[derive(Args, Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on
    #[arg(long, env = "ISPGATE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Allow the built-in development signing secret when none is set
    #[arg(long, env = "ISPGATE_DEV_MODE")]
    pub dev_mode: bool,

    /// SQLite credential database
    #[arg(long, env = "ISPGATE_DATABASE", default_value = "ispgate.db")]
    pub database: PathBuf,

    /// Redis URL of the shared rate-limit cache
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Refuse to start if the rate-limit cache cannot be reached
    #[arg(long)]
    pub require_cache: bool,

    /// Requests allowed per client per window
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 100)]
    pub rate_limit: u64,

    /// Rate-limit window length in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window_secs: u64,

    /// Behavior when the rate-limit cache fails: open or closed
    #[arg(long, default_value_t = FailureMode::Open)]
    pub rate_limit_failure_mode: FailureMode,

    /// Proxy address whose X-Forwarded-For header is trusted (repeatable)
    #[arg(long = "trusted-proxy")]
    pub trusted_proxies: Vec<IpAddr>,

    /// Credential store call timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Rate-limit cache call timeout in milliseconds
    #[arg(long, default_value_t = 250)]
    pub cache_timeout_ms: u64,

    /// Session token lifetime in hours
    #[arg(long, default_value_t = SESSION_TTL_HOURS)]
    pub session_ttl_hours: i64,

    /// Validity of new licenses in days when a request names none
    #[arg(long, default_value_t = ispgate_license::DEFAULT_DAYS_VALID)]
    pub license_days: i64,

    /// Modules enabled on new licenses when a request names none
    #[arg(long, value_delimiter = ',', default_value = "cache,https,monitoring")]
    pub default_modules: Vec<String>,
}

impl GatewayConfig {
    /// Resolves the signing secret, failing outside dev mode if unset.
    pub fn signing_secret(&self) -> TokenResult<SigningSecret> {
        SigningSecret::resolve(self.jwt_secret.as_deref(), self.dev_mode)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Validates the options and collects the route settings.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        if self.rate_window_secs == 0 {
            return Err(ConfigError::NotPositive {
                name: "--rate-window-secs",
            });
        }
        if self.session_ttl_hours <= 0 {
            return Err(ConfigError::NotPositive {
                name: "--session-ttl-hours",
            });
        }
        if self.license_days <= 0 {
            return Err(ConfigError::NotPositive {
                name: "--license-days",
            });
        }
        let modules: Vec<String> = self
            .default_modules
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if modules.is_empty() {
            return Err(ConfigError::NoModules);
        }

        Ok(Settings {
            rate_limit: self.rate_limit,
            rate_window: Duration::from_secs(self.rate_window_secs),
            trusted_proxies: TrustedProxies::new(self.trusted_proxies.clone()),
            session_ttl: chrono::Duration::hours(self.session_ttl_hours),
            license_defaults: LicenseDefaults {
                days_valid: self.license_days,
                modules: modules.into_iter().collect(),
            },
            ..Settings::default()
        })
    }
}

/// Validated settings shared by the routes.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rate_limit: u64,
    pub rate_window: Duration,
    pub trusted_proxies: TrustedProxies,
    pub session_ttl: chrono::Duration,
    pub license_defaults: LicenseDefaults,
    pub policy: PasswordPolicy,
    pub hash_params: HashParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate_limit: 100,
            rate_window: Duration::from_secs(60),
            trusted_proxies: TrustedProxies::default(),
            session_ttl: chrono::Duration::hours(SESSION_TTL_HOURS),
            license_defaults: LicenseDefaults::default(),
            policy: PasswordPolicy::default(),
            hash_params: HashParams::default(),
        }
    }
}
