//! In-process credential store.

use crate::error::{StoreError, StoreResult};
use crate::records::{AgentLicense, NewIdentity, NewLicense, NewResource};
use crate::{IdentityStore, LicenseStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ispgate_types::{
    Identity, IdentityId, IspResource, License, LicenseId, ResourceId, ResourceStatus,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    identities: Vec<Identity>,
    resources: Vec<IspResource>,
    licenses: Vec<License>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Credential store kept entirely in memory.
///
/// Can be switched into an outage mode where every call fails with
/// [`StoreError::Unavailable`], for exercising fail-closed paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
    last_seen_offline: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a full store outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes only `record_last_seen` fail, leaving reads working.
    pub fn set_last_seen_offline(&self, offline: bool) {
        self.last_seen_offline.store(offline, Ordering::SeqCst);
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".into()))
    }

    pub async fn insert_resource(&self, new: NewResource) -> StoreResult<IspResource> {
        let mut state = self.state()?;
        if state.resources.iter().any(|r| r.hw_id == new.hw_id) {
            return Err(StoreError::Conflict("hardware id already exists".into()));
        }
        let resource = IspResource {
            id: ResourceId::new(state.next_id()),
            name: new.name,
            hw_id: new.hw_id,
            status: new.status,
            last_seen: None,
        };
        state.resources.push(resource.clone());
        Ok(resource)
    }

    pub async fn set_resource_status(
        &self,
        id: ResourceId,
        status: ResourceStatus,
    ) -> StoreResult<bool> {
        let mut state = self.state()?;
        match state.resources.iter_mut().find(|r| r.id == id) {
            Some(resource) => {
                resource.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flips an identity's activation flag.
    pub async fn set_identity_active(&self, id: IdentityId, active: bool) -> StoreResult<bool> {
        let mut state = self.state()?;
        match state.identities.iter_mut().find(|i| i.id == id) {
            Some(identity) => {
                identity.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        Ok(self
            .state()?
            .identities
            .iter()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn find_identity(&self, id: IdentityId) -> StoreResult<Option<Identity>> {
        Ok(self.state()?.identities.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_identity(&self, new: NewIdentity) -> StoreResult<Identity> {
        let mut state = self.state()?;
        if state.identities.iter().any(|i| i.email == new.email) {
            return Err(StoreError::Conflict("email already exists".into()));
        }
        let identity = Identity {
            id: IdentityId::new(state.next_id()),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
        };
        state.identities.push(identity.clone());
        Ok(identity)
    }

    async fn update_password_hash(&self, id: IdentityId, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state()?;
        if let Some(identity) = state.identities.iter_mut().find(|i| i.id == id) {
            identity.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn find_agent_license(
        &self,
        license_key: &str,
        hw_id: &str,
    ) -> StoreResult<Option<AgentLicense>> {
        let state = self.state()?;
        let found = state
            .licenses
            .iter()
            .filter(|l| l.license_key == license_key)
            .find_map(|l| {
                state
                    .resources
                    .iter()
                    .find(|r| r.id == l.resource_id && r.hw_id == hw_id)
                    .map(|r| AgentLicense {
                        resource_id: l.resource_id,
                        expires_at: l.expires_at,
                        is_active: l.is_active,
                        modules: l.modules.clone(),
                        resource_status: r.status,
                    })
            });
        Ok(found)
    }

    async fn record_last_seen(&self, resource_id: ResourceId, at: DateTime<Utc>) -> StoreResult<()> {
        if self.last_seen_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("last-seen update rejected".into()));
        }
        let mut state = self.state()?;
        if let Some(resource) = state.resources.iter_mut().find(|r| r.id == resource_id) {
            resource.last_seen = Some(at);
        }
        Ok(())
    }

    async fn find_resource(&self, id: ResourceId) -> StoreResult<Option<IspResource>> {
        Ok(self.state()?.resources.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_license(&self, new: NewLicense) -> StoreResult<License> {
        let mut state = self.state()?;
        if state.licenses.iter().any(|l| l.license_key == new.license_key) {
            return Err(StoreError::Conflict("license key already exists".into()));
        }
        let license = License {
            id: LicenseId::new(state.next_id()),
            resource_id: new.resource_id,
            license_key: new.license_key,
            signed_token: new.signed_token,
            expires_at: new.expires_at,
            is_active: true,
            modules: new.modules,
            created_at: new.created_at,
        };
        state.licenses.push(license.clone());
        Ok(license)
    }

    async fn find_license(&self, id: LicenseId) -> StoreResult<Option<License>> {
        Ok(self.state()?.licenses.iter().find(|l| l.id == id).cloned())
    }

    async fn deactivate_license(&self, id: LicenseId) -> StoreResult<bool> {
        let mut state = self.state()?;
        match state.licenses.iter_mut().find(|l| l.id == id) {
            Some(license) => {
                license.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn licenses_for_resource(&self, resource_id: ResourceId) -> StoreResult<Vec<License>> {
        Ok(self
            .state()?
            .licenses
            .iter()
            .filter(|l| l.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn list_licenses(&self) -> StoreResult<Vec<License>> {
        let mut licenses = self.state()?.licenses.clone();
        licenses.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(licenses)
    }
}
