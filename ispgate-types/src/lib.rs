//! Core type definitions for the ISP platform trust boundary.
//!
//! This crate defines the records the authentication, licensing and rate
//! limiting crates pass between each other:
//! - Numeric identifiers for identities, ISP resources and licenses
//! - The closed set of platform roles
//! - Identity, license and ISP resource records as read from the store
//! - An injectable clock so expiry logic can be driven by tests
//!
//! Nothing here performs I/O.

mod clock;
mod identity;
mod ids;
mod license;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{CallerIdentity, Identity, Role};
pub use ids::{IdentityId, LicenseId, ResourceId};
pub use license::{IspResource, License, ResourceStatus};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid resource status: {0}")]
    InvalidStatus(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
