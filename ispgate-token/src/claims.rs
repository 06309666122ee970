//! Claim payloads carried inside tokens.

use chrono::{DateTime, Utc};
use ispgate_types::{CallerIdentity, IdentityId, ResourceId, Role};
use serde::{Deserialize, Serialize};

/// Claims of an interactive session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "user_id")]
    pub identity_id: IdentityId,
    pub email: String,
    pub role: Role,
    /// Issued-at, seconds since epoch.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiry, seconds since epoch.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl SessionClaims {
    /// The caller these claims vouch for.
    #[must_use]
    pub fn caller(&self) -> CallerIdentity {
        CallerIdentity {
            identity_id: self.identity_id,
            email: self.email.clone(),
            role: self.role,
        }
    }

    #[must_use]
    pub fn expires_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Claims of an agent license token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClaims {
    #[serde(rename = "isp_id")]
    pub resource_id: ResourceId,
    pub license_key: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}
