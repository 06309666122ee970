//! Password hashing and password policy for the ISP platform.
//!
//! - [`PasswordHasher`] produces salted Argon2id digests in PHC string form
//!   and verifies plaintexts against them.
//! - [`PasswordPolicy`] rejects passwords that fail the composition rules,
//!   always reporting the first violated rule in a fixed order.
//!
//! Both are immutable after construction and safe to share across tasks.

mod error;
mod hasher;
mod policy;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{HashParams, PasswordHasher};
pub use policy::{PasswordPolicy, PolicyViolation, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
