//! License key generation.

use rand::RngCore;

/// Prefix of every license key.
pub const LICENSE_KEY_PREFIX: &str = "ISP-";

const KEY_RANDOM_BYTES: usize = 12;

/// Generates a fresh license key: `ISP-` + 24 lowercase hex characters.
#[must_use]
pub fn generate_license_key() -> String {
    let mut bytes = [0u8; KEY_RANDOM_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{LICENSE_KEY_PREFIX}{}", hex::encode(bytes))
}

/// Returns true if `key` has the shape produced by [`generate_license_key`].
#[must_use]
pub fn is_well_formed_key(key: &str) -> bool {
    key.strip_prefix(LICENSE_KEY_PREFIX).is_some_and(|rest| {
        rest.len() == KEY_RANDOM_BYTES * 2
            && rest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}
