//! License and ISP resource records.

use crate::ids::{LicenseId, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Operational status of an ISP resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Normal operation.
    Active,
    /// Provisioned but not yet confirmed.
    Pending,
    /// Blocked by an administrator. Licenses bound to it stop validating.
    Suspended,
}

impl ResourceStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "suspended" => Ok(Self::Suspended),
            other => Err(crate::Error::InvalidStatus(other.to_string())),
        }
    }
}

/// An ISP resource: the hardware-bound record that licenses attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IspResource {
    pub id: ResourceId,
    pub name: String,
    /// Stable identifier of the host running the agent. Unique per resource.
    pub hw_id: String,
    pub status: ResourceStatus,
    pub last_seen: Option<DateTime<Utc>>,
}

/// A license issued to an ISP resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: LicenseId,
    #[serde(rename = "isp_id")]
    pub resource_id: ResourceId,
    /// Globally unique key the agent presents.
    pub license_key: String,
    /// Signed token minted at issuance.
    #[serde(skip_serializing)]
    pub signed_token: String,
    pub expires_at: DateTime<Utc>,
    /// Only ever flips from true to false.
    pub is_active: bool,
    pub modules: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl License {
    /// Picks the license a dashboard should treat as current: the one with
    /// the latest expiry. Several active licenses per resource are tolerated
    /// and not reconciled.
    #[must_use]
    pub fn most_recent(licenses: &[License]) -> Option<&License> {
        licenses
            .iter()
            .max_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)))
    }
}
