//! Signed session and license tokens.
//!
//! Tokens are HS256 JWTs signed with a process-wide shared secret that is
//! resolved once at startup and never changes afterwards.
//!
//! # Claim shapes
//!
//! - Session: `{user_id, email, role, iat, exp}`
//! - License: `{isp_id, license_key, iat, exp}`
//!
//! Verification reports a single opaque [`TokenError::Invalid`] for a bad
//! signature, a malformed token, or an expired one. Callers cannot tell these
//! apart.

mod claims;
mod error;
mod secret;
mod service;

pub use claims::{LicenseClaims, SessionClaims};
pub use error::{TokenError, TokenResult};
pub use secret::{SigningSecret, DEV_SIGNING_SECRET};
pub use service::{TokenService, SESSION_TTL_HOURS};
