//! Token issuance and verification.

use crate::claims::{LicenseClaims, SessionClaims};
use crate::error::{TokenError, TokenResult};
use crate::secret::SigningSecret;
use chrono::{DateTime, Duration, Utc};
use ispgate_types::{Clock, IdentityId, ResourceId, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Default session lifetime in hours.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Issues and verifies HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &SigningSecret, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock, without leeway.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Issues a session token valid for `ttl` from now.
    pub fn issue_session(
        &self,
        identity_id: IdentityId,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> TokenResult<String> {
        let now = self.clock.now();
        let claims = SessionClaims {
            identity_id,
            email: email.to_string(),
            role,
            issued_at: now.timestamp(),
            expires_at: (now + ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Issues the signed token stored alongside a license record.
    pub fn issue_license_token(
        &self,
        resource_id: ResourceId,
        license_key: &str,
        expires_at: DateTime<Utc>,
    ) -> TokenResult<String> {
        let claims = LicenseClaims {
            resource_id,
            license_key: license_key.to_string(),
            issued_at: self.clock.now().timestamp(),
            expires_at: expires_at.timestamp(),
        };
        self.sign(&claims)
    }

    /// Verifies a session token and returns its claims.
    pub fn verify_session(&self, token: &str) -> TokenResult<SessionClaims> {
        self.verify(token)
    }

    /// Verifies a license token and returns its claims.
    pub fn verify_license_token(&self, token: &str) -> TokenResult<LicenseClaims> {
        self.verify(token)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> TokenResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str) -> TokenResult<C> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        let exp = data
            .claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(TokenError::Invalid)?;
        if self.clock.now().timestamp() >= exp {
            return Err(TokenError::Invalid);
        }

        serde_json::from_value(Value::Object(data.claims)).map_err(|_| TokenError::InvalidClaims)
    }
}
