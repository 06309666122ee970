//! Identities, roles and the verified caller handed to request handlers.

use crate::ids::IdentityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role carried in session claims.
///
/// The set is closed: anything else is rejected at the boundary and never
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform operator. Issues and revokes licenses.
    Admin,
    /// Reseller managing a portfolio of ISPs.
    Distributor,
    /// An ISP operator account. Assigned when registration names no role.
    #[default]
    Isp,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Distributor, Role::Isp];

    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Distributor => "distributor",
            Self::Isp => "isp",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "distributor" => Ok(Self::Distributor),
            "isp" => Ok(Self::Isp),
            other => Err(crate::Error::InvalidRole(other.to_string())),
        }
    }
}

/// A user identity as stored in the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    /// PHC-formatted password digest. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

/// The verified caller of a session-protected request.
///
/// Only the session gate constructs one of these, and only from a token that
/// verified during the same request. Handlers receive it as an explicit
/// argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub identity_id: IdentityId,
    pub email: String,
    pub role: Role,
}

impl CallerIdentity {
    /// Returns true if the caller holds any of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
