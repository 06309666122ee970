//! Login, registration and session maintenance.

use crate::error::{ApiError, Envelope};
use crate::gate::Caller;
use crate::json::ApiJson;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ispgate_crypto::{CryptoError, PasswordHasher};
use ispgate_store::{NewIdentity, StoreError};
use ispgate_types::{IdentityId, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserSummary {
    id: IdentityId,
    email: String,
    role: Role,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    token: String,
    user: UserSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    token: String,
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn verify_password(
    hasher: &PasswordHasher,
    plaintext: String,
    digest: String,
) -> Result<Result<bool, CryptoError>, ApiError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
        .await
        .map_err(|_| ApiError::Internal)
}

async fn hash_password(hasher: &PasswordHasher, plaintext: String) -> Result<String, ApiError> {
    let hasher = hasher.clone();
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .map_err(|_| ApiError::Internal)??;
    Ok(digest)
}

fn issue(state: &AppState, id: IdentityId, email: &str, role: Role) -> Result<String, ApiError> {
    Ok(state
        .tokens
        .issue_session(id, email, role, state.settings().session_ttl)?)
}

pub(crate) async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<Envelope<SessionResponse>>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let identity = state.identities.find_identity_by_email(&req.email).await?;
    let digest = identity
        .as_ref()
        .map_or_else(|| state.dummy_digest.clone(), |i| i.password_hash.clone());

    let matches = match verify_password(&state.hasher, req.password, digest).await? {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Stored password digest for {} is unusable: {}", req.email, e);
            false
        }
    };

    let identity = match identity {
        Some(identity) if matches => identity,
        _ => {
            warn!("Login failed for {}", req.email);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };
    if !identity.is_active {
        warn!("Login refused for disabled account {}", identity.email);
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let token = issue(&state, identity.id, &identity.email, identity.role)?;
    info!("Identity {} logged in", identity.id);
    Ok(Json(
        Envelope::data(SessionResponse {
            token,
            user: UserSummary {
                id: identity.id,
                email: identity.email,
                role: identity.role,
            },
        })
        .with_message("Login successful"),
    ))
}

pub(crate) async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<SessionResponse>>), ApiError> {
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let role = match req.role.as_deref().map(str::trim) {
        None | Some("") => Role::default(),
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| ApiError::bad_request("Invalid role"))?,
    };
    state
        .policy
        .validate(&req.password)
        .map_err(|violation| ApiError::bad_request(violation.to_string()))?;

    let password_hash = hash_password(&state.hasher, req.password).await?;
    let identity = match state
        .identities
        .insert_identity(NewIdentity {
            email,
            password_hash,
            role,
        })
        .await
    {
        Ok(identity) => identity,
        Err(StoreError::Conflict(_)) => return Err(ApiError::bad_request("Email already exists")),
        Err(e) => return Err(e.into()),
    };

    let token = issue(&state, identity.id, &identity.email, identity.role)?;
    info!("Identity {} registered with role {}", identity.id, identity.role);
    Ok((
        StatusCode::CREATED,
        Json(
            Envelope::data(SessionResponse {
                token,
                user: UserSummary {
                    id: identity.id,
                    email: identity.email,
                    role: identity.role,
                },
            })
            .with_message("User registered successfully"),
        ),
    ))
}

pub(crate) async fn refresh(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Envelope<TokenResponse>>, ApiError> {
    let token = issue(&state, caller.identity_id, &caller.email, caller.role)?;
    Ok(Json(Envelope::data(TokenResponse { token })))
}

pub(crate) async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let identity = state
        .identities
        .find_identity(caller.identity_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let matches = verify_password(&state.hasher, req.current_password, identity.password_hash)
        .await?
        .unwrap_or(false);
    if !matches {
        warn!("Password change for identity {} with wrong current password", caller.identity_id);
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    state
        .policy
        .validate(&req.new_password)
        .map_err(|violation| ApiError::bad_request(violation.to_string()))?;

    let password_hash = hash_password(&state.hasher, req.new_password).await?;
    state
        .identities
        .update_password_hash(caller.identity_id, &password_hash)
        .await?;
    info!("Identity {} changed password", caller.identity_id);
    Ok(Json(Envelope::message("Password updated successfully")))
}
