//! Session store: the single owner of `Session` records.
//!
//! ARCHITECTURE
//! ============
//! Every record lives in an in-process map keyed by credential token. When a
//! remote session table is configured (`SessionPersistence`), records are
//! also written there so a browser can restore its identity after a restart.
//!
//! TRADE-OFFS
//! ==========
//! A failed remote write never fails session creation: the record stays in
//! the local map and the session is flagged `is_local_only`. The remote table
//! stores a SHA-256 of the token, not the token itself.
//!
//! The local map is bounded: records older than `SESSION_TTL` are pruned by
//! the sweeper, and past `capacity` the oldest record is evicted. An evicted
//! remote-backed session can still be restored from the table.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::identity::model::{Identity, Session};

/// Lifetime of a session and of the cookie that carries its token.
pub const SESSION_TTL: time::Duration = time::Duration::days(30);
pub const DEFAULT_LOCAL_SESSION_CAPACITY: usize = 50_000;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex credential token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Hash a credential token for remote storage.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// A session together with the identity it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session: Session,
    pub identity: Identity,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("remote session store not configured")]
    Unconfigured,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("corrupt session row: {0}")]
    Corrupt(String),
}

// =============================================================================
// REMOTE PERSISTENCE
// =============================================================================

#[async_trait::async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn insert(&self, record: &SessionRecord) -> Result<(), PersistenceError>;
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, PersistenceError>;
    async fn delete(&self, token: &str) -> Result<(), PersistenceError>;
}

/// Remote session table in Postgres (`sessions`, see `db/migrations`).
pub struct PgSessionPersistence {
    pool: PgPool,
}

impl PgSessionPersistence {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionPersistence for PgSessionPersistence {
    async fn insert(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        let identity =
            serde_json::to_value(&record.identity).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        sqlx::query(
            r"INSERT INTO sessions (token_hash, session_id, is_anonymous, identity, created_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(hash_token(&record.session.token))
        .bind(&record.session.session_id)
        .bind(record.session.is_anonymous)
        .bind(identity)
        .bind(record.session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, PersistenceError> {
        let row = sqlx::query(
            r"SELECT session_id, is_anonymous, identity, created_at
              FROM sessions
              WHERE token_hash = $1",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let identity: Identity = serde_json::from_value(row.get("identity"))
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        let session = Session {
            session_id: row.get("session_id"),
            token: token.to_owned(),
            created_at: row.get("created_at"),
            is_anonymous: row.get("is_anonymous"),
            is_local_only: false,
        };
        Ok(Some(SessionRecord { session, identity }))
    }

    async fn delete(&self, token: &str) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    remote: Option<Arc<dyn SessionPersistence>>,
    local: RwLock<HashMap<String, SessionRecord>>,
    capacity: usize,
}

fn is_expired(session: &Session, now: OffsetDateTime) -> bool {
    now - session.created_at > SESSION_TTL
}

impl SessionStore {
    #[must_use]
    pub fn new(remote: Option<Arc<dyn SessionPersistence>>) -> Self {
        Self { remote, local: RwLock::new(HashMap::new()), capacity: DEFAULT_LOCAL_SESSION_CAPACITY }
    }

    /// Bound the in-process map to `capacity` records (at least one).
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// A store that never reaches a remote table.
    #[must_use]
    pub fn local_only() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Create an anonymous session with a fresh credential token.
    ///
    /// `session_id` is the public handle; `force_local` marks the session
    /// local-only even if the remote write succeeds.
    pub async fn create_anonymous(&self, session_id: String, force_local: bool) -> SessionRecord {
        let session = Session::new(session_id, generate_token(), true);
        let identity = Identity::guest(&session.session_id);
        self.open(session, identity, force_local).await
    }

    /// Create a session for an authenticated account.
    pub async fn create_authenticated(&self, identity: Identity) -> SessionRecord {
        let session = Session::new(uuid::Uuid::new_v4().to_string(), generate_token(), false);
        self.open(session, identity, false).await
    }

    async fn open(&self, mut session: Session, identity: Identity, force_local: bool) -> SessionRecord {
        let persisted = match &self.remote {
            None => Err(PersistenceError::Unconfigured),
            Some(remote) => {
                let pending = SessionRecord { session: session.clone(), identity: identity.clone() };
                remote.insert(&pending).await
            }
        };
        match persisted {
            Ok(()) => session.is_local_only = force_local,
            Err(PersistenceError::Unconfigured) => session.is_local_only = true,
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session.session_id, "session persistence failed; keeping local-only session");
                session.is_local_only = true;
            }
        }

        let record = SessionRecord { session, identity };
        self.remember(record.session.token.clone(), record.clone())
            .await;
        record
    }

    /// Insert into the local map, evicting the oldest record when full.
    async fn remember(&self, token: String, record: SessionRecord) {
        let mut local = self.local.write().await;
        if !local.contains_key(&token) && local.len() >= self.capacity {
            let oldest = local
                .iter()
                .min_by_key(|(_, r)| r.session.created_at)
                .map(|(t, _)| t.clone());
            if let Some(oldest) = oldest {
                local.remove(&oldest);
                tracing::debug!(capacity = self.capacity, "local session map full; evicted oldest session");
            }
        }
        local.insert(token, record);
    }

    /// Drop local records older than `max_age`; returns how many went.
    pub async fn prune_expired(&self, max_age: time::Duration) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut local = self.local.write().await;
        let before = local.len();
        local.retain(|_, r| now - r.session.created_at <= max_age);
        before - local.len()
    }

    /// Look up the session bound to a stored credential token.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote table is configured but unreadable.
    pub async fn restore(&self, token: &str) -> Result<Option<SessionRecord>, PersistenceError> {
        if token.is_empty() {
            return Ok(None);
        }
        let local = self.local.read().await.get(token).cloned();
        let record = match (local, &self.remote) {
            (Some(record), _) => record,
            (None, None) => return Ok(None),
            (None, Some(remote)) => match remote.load(token).await? {
                Some(record) => record,
                None => return Ok(None),
            },
        };
        if is_expired(&record.session, OffsetDateTime::now_utc()) {
            tracing::debug!(session_id = %record.session.session_id, "stored session expired");
            self.invalidate(token).await;
            return Ok(None);
        }
        self.remember(token.to_owned(), record.clone()).await;
        Ok(Some(record))
    }

    /// Destroy a session locally and remotely. Remote failures are logged.
    pub async fn invalidate(&self, token: &str) {
        self.local.write().await.remove(token);
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.delete(token).await {
                tracing::warn!(error = %e, "remote session delete failed");
            }
        }
    }

    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.local.read().await.len()
    }
}

#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;
