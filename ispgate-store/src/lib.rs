//! Credential store adapter.
//!
//! The trust boundary never owns identity or license state. It issues point
//! queries and updates through two traits:
//! - [`IdentityStore`]: credentials, roles and activation flags
//! - [`LicenseStore`]: licenses joined to the ISP resources they bind to
//!
//! Two implementations are provided. [`SqliteStore`] persists to a SQLite
//! file and bounds every call with a timeout. [`MemoryStore`] keeps
//! everything in process for tests and local runs.

mod error;
mod memory;
mod records;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use records::{AgentLicense, NewIdentity, NewLicense, NewResource};
pub use sqlite::{SqliteStore, DEFAULT_STORE_TIMEOUT};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ispgate_types::{Identity, IdentityId, IspResource, License, LicenseId, ResourceId};

/// Identity records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks up an identity by its (unique) email.
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Looks up an identity by id.
    async fn find_identity(&self, id: IdentityId) -> StoreResult<Option<Identity>>;

    /// Inserts a new, active identity. A duplicate email is a [`StoreError::Conflict`].
    async fn insert_identity(&self, new: NewIdentity) -> StoreResult<Identity>;

    /// Replaces the stored password digest.
    async fn update_password_hash(&self, id: IdentityId, password_hash: &str) -> StoreResult<()>;
}

/// License records and the ISP resources they bind to.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Finds the license whose key matches `license_key` AND whose owning
    /// resource carries `hw_id`, in the same row.
    async fn find_agent_license(
        &self,
        license_key: &str,
        hw_id: &str,
    ) -> StoreResult<Option<AgentLicense>>;

    /// Records agent activity on a resource.
    async fn record_last_seen(&self, resource_id: ResourceId, at: DateTime<Utc>) -> StoreResult<()>;

    async fn find_resource(&self, id: ResourceId) -> StoreResult<Option<IspResource>>;

    /// Inserts a license. A duplicate key is a [`StoreError::Conflict`].
    async fn insert_license(&self, new: NewLicense) -> StoreResult<License>;

    async fn find_license(&self, id: LicenseId) -> StoreResult<Option<License>>;

    /// Sets `is_active` to false. Returns false if no such license exists.
    async fn deactivate_license(&self, id: LicenseId) -> StoreResult<bool>;

    /// Every license ever issued to a resource, oldest first.
    async fn licenses_for_resource(&self, resource_id: ResourceId) -> StoreResult<Vec<License>>;

    /// Every license in the store, newest first.
    async fn list_licenses(&self) -> StoreResult<Vec<License>>;
}
