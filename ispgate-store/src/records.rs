//! Insert payloads and join rows.

use chrono::{DateTime, Utc};
use ispgate_types::{ResourceId, ResourceStatus, Role};
use std::collections::BTreeSet;

/// A new identity to insert.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A new ISP resource to insert.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub name: String,
    pub hw_id: String,
    pub status: ResourceStatus,
}

/// A new license to insert. Licenses are always created active.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub resource_id: ResourceId,
    pub license_key: String,
    pub signed_token: String,
    pub expires_at: DateTime<Utc>,
    pub modules: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// A license joined to its owning resource, matched by key and hardware id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLicense {
    pub resource_id: ResourceId,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub modules: BTreeSet<String>,
    pub resource_status: ResourceStatus,
}
