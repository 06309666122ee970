//! Shared fixtures for store tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ispgate_store::{NewIdentity, NewLicense, NewResource};
use ispgate_types::{ResourceId, ResourceStatus, Role};
use std::collections::BTreeSet;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

pub fn new_identity(email: &str, role: Role) -> NewIdentity {
    NewIdentity {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
        role,
    }
}

pub fn new_resource(hw_id: &str) -> NewResource {
    NewResource {
        name: format!("ISP {hw_id}"),
        hw_id: hw_id.to_string(),
        status: ResourceStatus::Active,
    }
}

pub fn new_license(resource_id: ResourceId, key: &str, days: i64) -> NewLicense {
    NewLicense {
        resource_id,
        license_key: key.to_string(),
        signed_token: format!("token-for-{key}"),
        expires_at: base_time() + Duration::days(days),
        modules: BTreeSet::from(["cache".to_string(), "https".to_string()]),
        created_at: base_time(),
    }
}
