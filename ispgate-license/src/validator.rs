//! The license validation state machine.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use ispgate_store::{AgentLicense, LicenseStore};
use ispgate_types::{Clock, ResourceId, ResourceStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an agent presents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub license_key: String,
    pub hw_id: String,
}

/// What an accepted agent gets back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedLicense {
    pub isp_id: ResourceId,
    pub expires_at: DateTime<Utc>,
    pub modules: Vec<String>,
    pub status: String,
}

/// The stages a validation passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationStage {
    Lookup,
    ActiveCheck,
    ExpiryCheck,
    ResourceStatusCheck,
    Accept,
}

impl ValidationStage {
    /// The stage whose failure produces `err`, if it is a validation rejection.
    #[must_use]
    pub fn of(err: &LicenseError) -> Option<Self> {
        match err {
            LicenseError::NotFound => Some(Self::Lookup),
            LicenseError::Deactivated => Some(Self::ActiveCheck),
            LicenseError::Expired => Some(Self::ExpiryCheck),
            LicenseError::Suspended => Some(Self::ResourceStatusCheck),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lookup => "lookup",
            Self::ActiveCheck => "active-check",
            Self::ExpiryCheck => "expiry-check",
            Self::ResourceStatusCheck => "resource-status-check",
            Self::Accept => "accept",
        };
        f.write_str(name)
    }
}

/// Validates agent licenses against the credential store.
#[derive(Clone)]
pub struct LicenseValidator {
    store: Arc<dyn LicenseStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for LicenseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseValidator")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl LicenseValidator {
    pub fn new(store: Arc<dyn LicenseStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Runs a request through every stage.
    ///
    /// # Errors
    ///
    /// One of the four rejections, or [`LicenseError::Store`] if the store
    /// could not answer the lookup.
    pub async fn validate(&self, request: &ValidationRequest) -> LicenseResult<ValidatedLicense> {
        let record = self
            .store
            .find_agent_license(&request.license_key, &request.hw_id)
            .await?;

        let now = self.clock.now();
        let record = match record.ok_or(LicenseError::NotFound).and_then(|r| check(r, now)) {
            Ok(record) => record,
            Err(err) => {
                if let Some(stage) = ValidationStage::of(&err) {
                    debug!("License rejected at {}: {}", stage, err);
                }
                return Err(err);
            }
        };

        // Best effort: the agent is accepted even if this write fails.
        if let Err(e) = self.store.record_last_seen(record.resource_id, now).await {
            warn!("Failed to record last-seen for ISP {}: {}", record.resource_id, e);
        }

        info!("License validated for ISP {}", record.resource_id);
        Ok(ValidatedLicense {
            isp_id: record.resource_id,
            expires_at: record.expires_at,
            modules: record.modules.into_iter().collect(),
            status: "active".to_string(),
        })
    }
}

/// Stages 2-4 over a looked-up record.
fn check(record: AgentLicense, now: DateTime<Utc>) -> LicenseResult<AgentLicense> {
    if !record.is_active {
        return Err(LicenseError::Deactivated);
    }
    if now > record.expires_at {
        return Err(LicenseError::Expired);
    }
    if record.resource_status == ResourceStatus::Suspended {
        return Err(LicenseError::Suspended);
    }
    Ok(record)
}
