//! Session authentication gate.
//!
//! A handler that takes a [`Caller`] only runs if the request carried a
//! bearer token that verified during this request. Nothing is looked up in
//! the store: a session ends only when its token expires.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use ispgate_token::TokenError;
use ispgate_types::{CallerIdentity, Role};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Why the gate turned a request away. Each maps to a fixed 401 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    MissingHeader,
    NotBearer,
    InvalidToken,
    InvalidClaims,
}

impl SessionRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header required",
            Self::NotBearer => "Bearer token required",
            Self::InvalidToken => "Invalid token",
            Self::InvalidClaims => "Invalid token claims",
        }
    }
}

impl fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<SessionRejection> for ApiError {
    fn from(rejection: SessionRejection) -> Self {
        ApiError::unauthorized(rejection.message())
    }
}

/// The verified caller of a session-protected route.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl Caller {
    /// Rejects with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if self.0.has_any_role(roles) {
            Ok(())
        } else {
            debug!(
                "Identity {} with role {} denied, needs one of {:?}",
                self.0.identity_id, self.0.role, roles
            );
            Err(ApiError::Forbidden("Insufficient permissions".into()))
        }
    }
}

impl Deref for Caller {
    type Target = CallerIdentity;

    fn deref(&self) -> &CallerIdentity {
        &self.0
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(SessionRejection::MissingHeader)?;
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .ok_or(SessionRejection::NotBearer)?;

        match state.tokens.verify_session(token) {
            Ok(claims) => Ok(Caller(claims.caller())),
            Err(TokenError::InvalidClaims) => Err(SessionRejection::InvalidClaims.into()),
            Err(_) => Err(SessionRejection::InvalidToken.into()),
        }
    }
}
