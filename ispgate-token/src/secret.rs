//! The shared signing secret.

use crate::error::{TokenError, TokenResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Well-known secret accepted only in development mode.
pub const DEV_SIGNING_SECRET: &str = "ispgate-dev-secret-change-in-production";

/// HMAC signing secret, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret {
    bytes: Vec<u8>,
    #[zeroize(skip)]
    development: bool,
}

impl SigningSecret {
    /// Wraps an explicitly configured secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> TokenResult<Self> {
        let bytes = secret.into();
        if bytes.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            bytes,
            development: false,
        })
    }

    /// The well-known development secret.
    #[must_use]
    pub fn development() -> Self {
        Self {
            bytes: DEV_SIGNING_SECRET.as_bytes().to_vec(),
            development: true,
        }
    }

    /// Resolves the startup secret.
    ///
    /// An explicit non-empty secret always wins. Without one, the
    /// development secret is used only when `dev_mode` is set; otherwise
    /// startup must fail.
    pub fn resolve(configured: Option<&str>, dev_mode: bool) -> TokenResult<Self> {
        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret),
            None if dev_mode => Ok(Self::development()),
            None => Err(TokenError::MissingSecret),
        }
    }

    /// True if this is the well-known development secret.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.development
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"[REDACTED]")
            .field("development", &self.development)
            .finish()
    }
}
