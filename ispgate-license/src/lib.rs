//! Hardware-bound license validation and issuance for ISP agents.
//!
//! This crate handles:
//! - Validating an agent's license key against the hardware id of the ISP
//!   resource it is bound to
//! - Issuing new licenses (admin only) with a signed license token
//! - One-way revocation
//! - Picking the current license of a resource for dashboards
//!
//! # Validation order
//!
//! Checks always run in the same order and the first failure is reported:
//!
//! 1. Lookup: key and hardware id must match the same row
//! 2. Active: the license must not be revoked
//! 3. Expiry: now must not be past `expires_at`
//! 4. Resource status: the ISP must not be suspended
//! 5. Accept: last-seen is recorded (best effort)
//!
//! A caller with a valid key on the wrong machine sees exactly what a caller
//! with an unknown key sees.
//!
//! # License Key Format
//!
//! `ISP-` followed by 24 lowercase hex characters from the OS CSPRNG.

mod error;
mod issuer;
mod key;
mod validator;

pub use error::{LicenseError, LicenseResult};
pub use issuer::{CreateLicense, LicenseDefaults, LicenseIssuer, DEFAULT_DAYS_VALID};
pub use key::{generate_license_key, is_well_formed_key, LICENSE_KEY_PREFIX};
pub use validator::{LicenseValidator, ValidatedLicense, ValidationRequest, ValidationStage};
