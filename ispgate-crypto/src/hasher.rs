//! Salted, adaptive password hashing.
//!
//! Uses Argon2id and stores digests as PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the cost parameters
//! travel with each digest and verification needs no configuration.

use crate::error::{CryptoError, CryptoResult};
use argon2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Argon2id cost parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Hashes and verifies passwords.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: HashParams,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(HashParams::default())
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    /// Returns the cost parameters new digests are produced with.
    #[must_use]
    pub fn params(&self) -> &HashParams {
        &self.params
    }

    fn argon2(&self) -> CryptoResult<Argon2<'static>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            None,
        )
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hashes `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> CryptoResult<String> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CryptoError::Hashing(e.to_string()))?;
        Ok(digest.to_string())
    }

    /// Checks `plaintext` against `digest`.
    ///
    /// A mismatch is `Ok(false)`. Only a digest that this hasher could not
    /// have produced is an error.
    pub fn verify(&self, plaintext: &str, digest: &str) -> CryptoResult<bool> {
        let parsed = PasswordHash::new(digest).map_err(|_| CryptoError::MalformedDigest)?;
        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return Err(CryptoError::MalformedDigest);
        }

        // The digest carries its own cost parameters.
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CryptoError::MalformedDigest),
        }
    }
}
