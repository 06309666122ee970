//! Spins up the gateway on an OS-assigned port over in-memory stores.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use ispgate_crypto::{HashParams, PasswordHasher};
use ispgate_ratelimit::{FailureMode, MemoryCounterStore, RateLimiter};
use ispgate_server::{build_router, AppState, Envelope, Settings};
use ispgate_store::{IdentityStore, LicenseStore, MemoryStore, NewIdentity, NewLicense, NewResource};
use ispgate_token::{SigningSecret, TokenService};
use ispgate_types::{Clock, Identity, License, ManualClock, ResourceId, ResourceStatus, Role};
use serde_json::Value;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

pub const SECRET: &str = "gateway-test-secret";
pub const PASSWORD: &str = "Corr3ct!Horse";

/// Cheap Argon2 parameters so tests do not spend seconds hashing.
pub fn fast_hash_params() -> HashParams {
    HashParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

pub fn test_settings() -> Settings {
    Settings {
        rate_limit: 1000,
        hash_params: fast_hash_params(),
        ..Settings::default()
    }
}

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub counters: Arc<MemoryCounterStore>,
    pub clock: ManualClock,
    pub tokens: TokenService,
}

pub async fn spawn() -> TestServer {
    spawn_with(test_settings(), FailureMode::Open).await
}

pub async fn spawn_with(settings: Settings, mode: FailureMode) -> TestServer {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap());
    let store = Arc::new(MemoryStore::new());
    let counters = Arc::new(MemoryCounterStore::new(Arc::new(clock.clone())));
    let limiter = RateLimiter::new(counters.clone(), mode);
    let secret = SigningSecret::new(SECRET).unwrap();
    let state = AppState::new(
        store.clone(),
        limiter,
        &secret,
        Arc::new(clock.clone()),
        settings,
    )
    .unwrap();

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        counters,
        tokens: TokenService::new(&secret, Arc::new(clock.clone())),
        clock,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn identity(&self, email: &str, role: Role) -> Identity {
        let password_hash = PasswordHasher::new(fast_hash_params()).hash(PASSWORD).unwrap();
        self.store
            .insert_identity(NewIdentity {
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .unwrap()
    }

    /// A session token for a freshly inserted identity.
    pub async fn session(&self, email: &str, role: Role) -> String {
        let identity = self.identity(email, role).await;
        self.tokens
            .issue_session(identity.id, &identity.email, role, Duration::hours(24))
            .unwrap()
    }

    pub async fn resource(&self, hw_id: &str, status: ResourceStatus) -> ResourceId {
        self.store
            .insert_resource(NewResource {
                name: format!("ISP {hw_id}"),
                hw_id: hw_id.to_string(),
                status,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn license(&self, resource_id: ResourceId, key: &str, days: i64) -> License {
        self.store
            .insert_license(NewLicense {
                resource_id,
                license_key: key.to_string(),
                signed_token: String::new(),
                expires_at: self.clock.now() + Duration::days(days),
                modules: BTreeSet::from(["cache".to_string(), "https".to_string()]),
                created_at: self.clock.now(),
            })
            .await
            .unwrap()
    }
}

/// Reads a response into its status and envelope.
pub async fn envelope(resp: reqwest::Response) -> (u16, Envelope<Value>) {
    let status = resp.status().as_u16();
    let body = resp.json::<Envelope<Value>>().await.unwrap();
    (status, body)
}
