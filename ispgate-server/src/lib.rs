//! HTTP trust gateway for the ISP platform.
//!
//! Every request passes the rate limiter first. Agent and public routes
//! proceed directly; session-protected routes take a [`Caller`] extractor
//! that verifies the bearer token and hands the typed caller identity to
//! the handler.

pub mod config;
mod error;
mod gate;
mod json;
mod rate_limit;
mod routes;

pub use config::{ConfigError, GatewayConfig, Settings};
pub use error::{ApiError, Envelope};
pub use gate::{Caller, SessionRejection};

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use ispgate_crypto::{CryptoError, PasswordHasher, PasswordPolicy};
use ispgate_license::{LicenseIssuer, LicenseValidator};
use ispgate_ratelimit::RateLimiter;
use ispgate_store::{IdentityStore, LicenseStore};
use ispgate_token::{SigningSecret, TokenService};
use ispgate_types::Clock;
use std::fmt;
use std::sync::Arc;

/// Shared state behind every route. Immutable after construction.
pub struct AppState {
    identities: Arc<dyn IdentityStore>,
    validator: LicenseValidator,
    issuer: LicenseIssuer,
    tokens: TokenService,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    limiter: RateLimiter,
    settings: Settings,
    /// Verified against when an email is unknown, so login timing does not
    /// reveal which accounts exist.
    dummy_digest: String,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("limiter", &self.limiter)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the components together over one credential store.
    pub fn new<S>(
        store: Arc<S>,
        limiter: RateLimiter,
        secret: &SigningSecret,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Result<Arc<Self>, CryptoError>
    where
        S: IdentityStore + LicenseStore + 'static,
    {
        let tokens = TokenService::new(secret, clock.clone());
        let hasher = PasswordHasher::new(settings.hash_params.clone());
        let dummy_digest = hasher.hash("ispgate-login-timing-placeholder")?;
        Ok(Arc::new(Self {
            identities: store.clone(),
            validator: LicenseValidator::new(store.clone(), clock.clone()),
            issuer: LicenseIssuer::new(
                store,
                tokens.clone(),
                clock,
                settings.license_defaults.clone(),
            ),
            tokens,
            hasher,
            policy: settings.policy.clone(),
            limiter,
            settings,
            dummy_digest,
        }))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Builds the HTTP router. The rate limiter wraps every route, the 404
/// fallback included.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/password", put(routes::auth::change_password))
        .route(
            "/api/licenses",
            get(routes::licenses::list).post(routes::licenses::create),
        )
        .route("/api/licenses/validate", post(routes::licenses::validate))
        .route("/api/licenses/{id}", get(routes::licenses::get_license))
        .route("/api/licenses/{id}/revoke", post(routes::licenses::revoke))
        .route("/api/isps/{id}/license", get(routes::licenses::current))
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .with_state(state)
}
