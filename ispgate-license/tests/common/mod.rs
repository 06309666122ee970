//! Shared fixtures for license tests.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use ispgate_license::{LicenseDefaults, LicenseIssuer, LicenseValidator};
use ispgate_store::{LicenseStore, MemoryStore, NewLicense, NewResource};
use ispgate_token::{SigningSecret, TokenService};
use ispgate_types::{
    CallerIdentity, Clock, IdentityId, License, ManualClock, ResourceId, ResourceStatus, Role,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub validator: LicenseValidator,
    pub issuer: LicenseIssuer,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap());
        let tokens = TokenService::new(
            &SigningSecret::new("license-test-secret").unwrap(),
            Arc::new(clock.clone()),
        );
        let validator = LicenseValidator::new(store.clone(), Arc::new(clock.clone()));
        let issuer = LicenseIssuer::new(
            store.clone(),
            tokens,
            Arc::new(clock.clone()),
            LicenseDefaults::default(),
        );
        Self {
            store,
            clock,
            validator,
            issuer,
        }
    }

    pub async fn resource(&self, hw_id: &str) -> ResourceId {
        self.store
            .insert_resource(NewResource {
                name: format!("ISP {hw_id}"),
                hw_id: hw_id.to_string(),
                status: ResourceStatus::Active,
            })
            .await
            .unwrap()
            .id
    }

    /// Inserts a license with a fixed key, bypassing the issuer.
    pub async fn license(&self, resource_id: ResourceId, key: &str, days: i64) -> License {
        self.store
            .insert_license(NewLicense {
                resource_id,
                license_key: key.to_string(),
                signed_token: String::new(),
                expires_at: self.clock.now() + Duration::days(days),
                modules: BTreeSet::from(["cache".to_string(), "monitoring".to_string()]),
                created_at: self.clock.now(),
            })
            .await
            .unwrap()
    }
}

pub fn admin() -> CallerIdentity {
    caller(Role::Admin)
}

pub fn caller(role: Role) -> CallerIdentity {
    CallerIdentity {
        identity_id: IdentityId::new(1),
        email: "ops@example.com".to_string(),
        role,
    }
}
