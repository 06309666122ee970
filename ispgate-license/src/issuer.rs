//! License issuance and revocation.

use crate::error::{LicenseError, LicenseResult};
use crate::key::generate_license_key;
use chrono::Duration;
use ispgate_store::{LicenseStore, NewLicense, StoreError};
use ispgate_token::TokenService;
use ispgate_types::{CallerIdentity, Clock, License, LicenseId, ResourceId, Role};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Validity applied when a request names none.
pub const DEFAULT_DAYS_VALID: i64 = 30;

/// Attempts at drawing an unused key before giving up.
const KEY_ATTEMPTS: usize = 3;

/// Values applied to issuance requests that omit them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseDefaults {
    pub days_valid: i64,
    pub modules: BTreeSet<String>,
}

impl Default for LicenseDefaults {
    fn default() -> Self {
        Self {
            days_valid: DEFAULT_DAYS_VALID,
            modules: ["cache", "https", "monitoring"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// An issuance request as received from an administrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLicense {
    pub isp_id: Option<ResourceId>,
    pub days_valid: Option<i64>,
    pub modules: Option<Vec<String>>,
}

/// Creates and revokes licenses.
#[derive(Clone)]
pub struct LicenseIssuer {
    store: Arc<dyn LicenseStore>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
    defaults: LicenseDefaults,
}

impl fmt::Debug for LicenseIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseIssuer")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl LicenseIssuer {
    pub fn new(
        store: Arc<dyn LicenseStore>,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
        defaults: LicenseDefaults,
    ) -> Self {
        Self {
            store,
            tokens,
            clock,
            defaults,
        }
    }

    /// Issues a license bound to an existing ISP resource.
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        request: CreateLicense,
    ) -> LicenseResult<License> {
        require_admin(caller)?;

        let resource_id = match request.isp_id {
            Some(id) if id.get() != 0 => id,
            _ => return Err(LicenseError::MissingResource),
        };
        let days_valid = match request.days_valid {
            None | Some(0) => self.defaults.days_valid,
            Some(days) if days > 0 => days,
            Some(days) => {
                return Err(LicenseError::InvalidRequest(format!(
                    "days_valid must be positive, got {days}"
                )));
            }
        };
        let modules: BTreeSet<String> = match request.modules {
            Some(modules) if !modules.is_empty() => modules.into_iter().collect(),
            _ => self.defaults.modules.clone(),
        };

        if self.store.find_resource(resource_id).await?.is_none() {
            return Err(LicenseError::UnknownResource(resource_id));
        }

        let now = self.clock.now();
        let expires_at = now + Duration::days(days_valid);

        for _ in 0..KEY_ATTEMPTS {
            let license_key = generate_license_key();
            let signed_token = self
                .tokens
                .issue_license_token(resource_id, &license_key, expires_at)?;
            let new = NewLicense {
                resource_id,
                license_key,
                signed_token,
                expires_at,
                modules: modules.clone(),
                created_at: now,
            };
            match self.store.insert_license(new).await {
                Ok(license) => {
                    info!(
                        "License {} created for ISP {} by {}",
                        license.id, resource_id, caller.identity_id
                    );
                    return Ok(license);
                }
                Err(StoreError::Conflict(_)) => {
                    warn!("License key collision, drawing a new key");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LicenseError::Store(StoreError::Conflict(
            "could not allocate a unique license key".into(),
        )))
    }

    /// Revokes a license. There is no way back.
    pub async fn revoke(&self, caller: &CallerIdentity, id: LicenseId) -> LicenseResult<()> {
        require_admin(caller)?;
        if !self.store.deactivate_license(id).await? {
            return Err(LicenseError::UnknownLicense(id));
        }
        info!("License {} revoked by {}", id, caller.identity_id);
        Ok(())
    }

    /// Looks up one license.
    pub async fn license(&self, id: LicenseId) -> LicenseResult<License> {
        self.store
            .find_license(id)
            .await?
            .ok_or(LicenseError::UnknownLicense(id))
    }

    /// Every issued license, newest first.
    pub async fn licenses(&self) -> LicenseResult<Vec<License>> {
        Ok(self.store.list_licenses().await?)
    }

    /// The license with the latest expiry for a resource, if any.
    pub async fn current_license(&self, resource_id: ResourceId) -> LicenseResult<Option<License>> {
        let licenses = self.store.licenses_for_resource(resource_id).await?;
        Ok(License::most_recent(&licenses).cloned())
    }
}

fn require_admin(caller: &CallerIdentity) -> LicenseResult<()> {
    if caller.role == Role::Admin {
        Ok(())
    } else {
        Err(LicenseError::Forbidden)
    }
}
