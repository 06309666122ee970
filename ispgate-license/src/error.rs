//! Error types for the licensing module.

use ispgate_store::StoreError;
use ispgate_token::TokenError;
use ispgate_types::{LicenseId, ResourceId};
use thiserror::Error;

/// Licensing errors.
///
/// The first four variants are the agent-facing rejections; their messages
/// are part of the wire contract.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Unknown key, or known key on the wrong hardware.
    #[error("Invalid license or hardware ID")]
    NotFound,

    /// License has been revoked.
    #[error("License is deactivated")]
    Deactivated,

    /// License is past its expiry.
    #[error("License has expired")]
    Expired,

    /// Owning ISP is suspended.
    #[error("ISP account is suspended")]
    Suspended,

    /// Issuance request named no ISP.
    #[error("ISP ID is required")]
    MissingResource,

    /// Issuance request named an ISP that does not exist.
    #[error("ISP {0} not found")]
    UnknownResource(ResourceId),

    /// Revocation named a license that does not exist.
    #[error("License not found")]
    UnknownLicense(LicenseId),

    /// Caller lacks the admin role.
    #[error("Admin access required")]
    Forbidden,

    /// Issuance parameters out of range.
    #[error("invalid license request: {0}")]
    InvalidRequest(String),

    /// Signing the license token failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Credential store failure. Never treated as acceptance.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LicenseError {
    /// True for the four agent-facing validation rejections.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Deactivated | Self::Expired | Self::Suspended
        )
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
