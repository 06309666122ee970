//! License routes: agent validation and admin issuance.

use crate::error::{ApiError, Envelope};
use crate::gate::Caller;
use crate::json::ApiJson;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use ispgate_license::{CreateLicense, ValidatedLicense, ValidationRequest};
use ispgate_types::{License, LicenseId, ResourceId, Role};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct CreatedLicense {
    id: LicenseId,
    license_key: String,
    expires_at: DateTime<Utc>,
}

fn license_id(raw: &str) -> Result<LicenseId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("License not found".into()))
}

/// Agent-facing. No session: the license key and hardware id are the
/// credentials.
pub(crate) async fn validate(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ValidationRequest>,
) -> Result<Json<Envelope<ValidatedLicense>>, ApiError> {
    let validated = state.validator.validate(&req).await?;
    Ok(Json(Envelope::data(validated).with_message("License is valid")))
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ApiJson(req): ApiJson<CreateLicense>,
) -> Result<(StatusCode, Json<Envelope<CreatedLicense>>), ApiError> {
    let license = state.issuer.create(&caller, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(
            Envelope::data(CreatedLicense {
                id: license.id,
                license_key: license.license_key,
                expires_at: license.expires_at,
            })
            .with_message("License created successfully"),
        ),
    ))
}

pub(crate) async fn revoke(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.issuer.revoke(&caller, license_id(&id)?).await?;
    Ok(Json(Envelope::message("License revoked successfully")))
}

/// Every issued license, newest first.
pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Envelope<Vec<License>>>, ApiError> {
    caller.require_role(&[Role::Admin, Role::Distributor])?;
    let licenses = state.issuer.licenses().await?;
    Ok(Json(Envelope::data(licenses)))
}

/// Any signed-in caller may read a single license.
pub(crate) async fn get_license(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<License>>, ApiError> {
    let license = state.issuer.license(license_id(&id)?).await?;
    Ok(Json(Envelope::data(license)))
}

/// The license with the latest expiry for an ISP.
pub(crate) async fn current(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<License>>, ApiError> {
    caller.require_role(&[Role::Admin, Role::Distributor])?;
    let not_found = || ApiError::NotFound("License not found".into());
    let resource_id: ResourceId = id.parse().map_err(|_| not_found())?;
    let license = state
        .issuer
        .current_license(resource_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(Envelope::data(license)))
}
