//! SQLite-backed credential store.
//!
//! A single connection guarded by a mutex. Every call runs on the blocking
//! pool inside a transaction and is abandoned once its deadline passes. An
//! abandoned call never commits, so a caller that saw `Timeout` saw no write.

use crate::error::{StoreError, StoreResult};
use crate::records::{AgentLicense, NewIdentity, NewLicense, NewResource};
use crate::{IdentityStore, LicenseStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ispgate_types::{
    Identity, IdentityId, IspResource, License, LicenseId, ResourceId, ResourceStatus, Role,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Deadline applied to each store call unless configured otherwise.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

const LICENSE_COLUMNS: &str =
    "id, isp_id, license_key, token, expires_at, is_active, modules, created_at";

/// Persistent credential store backed by SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path, timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("failed to open store: {e}")))?;
        Self::with_connection(conn, timeout)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("failed to open in-memory store: {e}")))?;
        Self::with_connection(conn, DEFAULT_STORE_TIMEOUT)
    }

    fn with_connection(conn: Connection, timeout: Duration) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('admin', 'distributor', 'isp')),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS isps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                hw_id TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'active',
                last_seen TEXT
            );

            CREATE TABLE IF NOT EXISTS licenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                isp_id INTEGER NOT NULL REFERENCES isps(id),
                license_key TEXT NOT NULL UNIQUE,
                token TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                modules TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_licenses_isp ON licenses(isp_id);
            ",
        )?;
        Ok(())
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let claim = Arc::new(AtomicU8::new(PENDING));
        let worker_claim = Arc::clone(&claim);
        let mut task = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
            if worker_claim.load(Ordering::Acquire) == ABANDONED {
                return Err(StoreError::Timeout);
            }
            let tx = conn.unchecked_transaction()?;
            let value = op(&tx)?;
            // Dropping the transaction rolls it back.
            if worker_claim
                .compare_exchange(PENDING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(StoreError::Timeout);
            }
            tx.commit()?;
            Ok(value)
        });

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                if claim
                    .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return Err(StoreError::Timeout);
                }
                // The worker is already committing; report what it did.
                task.await
            }
        };
        joined.unwrap_or_else(|e| Err(StoreError::Unavailable(format!("store task failed: {e}"))))
    }

    /// Inserts an ISP resource. ISP management lives outside the trust
    /// boundary; this exists for provisioning and tests.
    pub async fn insert_resource(&self, new: NewResource) -> StoreResult<IspResource> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO isps (name, hw_id, status) VALUES (?1, ?2, ?3)",
                params![new.name, new.hw_id, new.status.as_str()],
            )
            .map_err(|e| StoreError::from_sqlite(e, "hardware id"))?;
            let id = ResourceId::new(conn.last_insert_rowid());
            debug!("Inserted ISP resource {}", id);
            Ok(IspResource {
                id,
                name: new.name,
                hw_id: new.hw_id,
                status: new.status,
                last_seen: None,
            })
        })
        .await
    }

    /// Changes a resource's status (suspend / reactivate).
    pub async fn set_resource_status(
        &self,
        id: ResourceId,
        status: ResourceStatus,
    ) -> StoreResult<bool> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE isps SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.get()],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

fn parse_time(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp {raw:?}: {e}")))
}

fn parse_modules(raw: &str) -> StoreResult<BTreeSet<String>> {
    Ok(serde_json::from_str(raw)?)
}

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, bool)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_identity(raw: (i64, String, String, String, bool)) -> StoreResult<Identity> {
    let (id, email, password_hash, role, is_active) = raw;
    let role: Role = role
        .parse()
        .map_err(|e: ispgate_types::Error| StoreError::InvalidData(e.to_string()))?;
    Ok(Identity {
        id: IdentityId::new(id),
        email,
        password_hash,
        role,
        is_active,
    })
}

type LicenseRow = (i64, i64, String, String, String, bool, String, String);

fn license_from_row(row: &Row<'_>) -> rusqlite::Result<LicenseRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_license(raw: LicenseRow) -> StoreResult<License> {
    let (id, isp_id, license_key, token, expires_at, is_active, modules, created_at) = raw;
    Ok(License {
        id: LicenseId::new(id),
        resource_id: ResourceId::new(isp_id),
        license_key,
        signed_token: token,
        expires_at: parse_time(&expires_at)?,
        is_active,
        modules: parse_modules(&modules)?,
        created_at: parse_time(&created_at)?,
    })
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let email = email.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, email, password_hash, role, is_active FROM users WHERE email = ?1",
                params![email],
                identity_from_row,
            )
            .optional()?
            .map(into_identity)
            .transpose()
        })
        .await
    }

    async fn find_identity(&self, id: IdentityId) -> StoreResult<Option<Identity>> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, email, password_hash, role, is_active FROM users WHERE id = ?1",
                params![id.get()],
                identity_from_row,
            )
            .optional()?
            .map(into_identity)
            .transpose()
        })
        .await
    }

    async fn insert_identity(&self, new: NewIdentity) -> StoreResult<Identity> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO users (email, password_hash, role) VALUES (?1, ?2, ?3)",
                params![new.email, new.password_hash, new.role.as_str()],
            )
            .map_err(|e| StoreError::from_sqlite(e, "email"))?;
            Ok(Identity {
                id: IdentityId::new(conn.last_insert_rowid()),
                email: new.email,
                password_hash: new.password_hash,
                role: new.role,
                is_active: true,
            })
        })
        .await
    }

    async fn update_password_hash(&self, id: IdentityId, password_hash: &str) -> StoreResult<()> {
        let password_hash = password_hash.to_string();
        self.run(move |conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                params![password_hash, id.get()],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LicenseStore for SqliteStore {
    async fn find_agent_license(
        &self,
        license_key: &str,
        hw_id: &str,
    ) -> StoreResult<Option<AgentLicense>> {
        let license_key = license_key.to_string();
        let hw_id = hw_id.to_string();
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT l.isp_id, l.expires_at, l.is_active, l.modules, i.status
                     FROM licenses l
                     JOIN isps i ON l.isp_id = i.id
                     WHERE l.license_key = ?1 AND i.hw_id = ?2",
                    params![license_key, hw_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, bool>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((isp_id, expires_at, is_active, modules, status)) = row else {
                return Ok(None);
            };
            let resource_status: ResourceStatus = status
                .parse()
                .map_err(|e: ispgate_types::Error| StoreError::InvalidData(e.to_string()))?;
            Ok(Some(AgentLicense {
                resource_id: ResourceId::new(isp_id),
                expires_at: parse_time(&expires_at)?,
                is_active,
                modules: parse_modules(&modules)?,
                resource_status,
            }))
        })
        .await
    }

    async fn record_last_seen(&self, resource_id: ResourceId, at: DateTime<Utc>) -> StoreResult<()> {
        self.run(move |conn| {
            conn.execute(
                "UPDATE isps SET last_seen = ?1 WHERE id = ?2",
                params![at.to_rfc3339(), resource_id.get()],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_resource(&self, id: ResourceId) -> StoreResult<Option<IspResource>> {
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, hw_id, status, last_seen FROM isps WHERE id = ?1",
                    params![id.get()],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, name, hw_id, status, last_seen)) = row else {
                return Ok(None);
            };
            Ok(Some(IspResource {
                id: ResourceId::new(id),
                name,
                hw_id,
                status: status
                    .parse()
                    .map_err(|e: ispgate_types::Error| StoreError::InvalidData(e.to_string()))?,
                last_seen: last_seen.as_deref().map(parse_time).transpose()?,
            }))
        })
        .await
    }

    async fn insert_license(&self, new: NewLicense) -> StoreResult<License> {
        self.run(move |conn| {
            let modules = serde_json::to_string(&new.modules)?;
            conn.execute(
                "INSERT INTO licenses (isp_id, license_key, token, expires_at, modules, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.resource_id.get(),
                    new.license_key,
                    new.signed_token,
                    new.expires_at.to_rfc3339(),
                    modules,
                    new.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::from_sqlite(e, "license key"))?;
            Ok(License {
                id: LicenseId::new(conn.last_insert_rowid()),
                resource_id: new.resource_id,
                license_key: new.license_key,
                signed_token: new.signed_token,
                expires_at: new.expires_at,
                is_active: true,
                modules: new.modules,
                created_at: new.created_at,
            })
        })
        .await
    }

    async fn find_license(&self, id: LicenseId) -> StoreResult<Option<License>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {LICENSE_COLUMNS} FROM licenses WHERE id = ?1"),
                params![id.get()],
                license_from_row,
            )
            .optional()?
            .map(into_license)
            .transpose()
        })
        .await
    }

    async fn deactivate_license(&self, id: LicenseId) -> StoreResult<bool> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE licenses SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                params![id.get()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn licenses_for_resource(&self, resource_id: ResourceId) -> StoreResult<Vec<License>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LICENSE_COLUMNS} FROM licenses WHERE isp_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map(params![resource_id.get()], license_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(into_license).collect()
        })
        .await
    }

    async fn list_licenses(&self) -> StoreResult<Vec<License>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LICENSE_COLUMNS} FROM licenses ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], license_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(into_license).collect()
        })
        .await
    }
}
