// ============================
// canary-backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction for users and sessions.
//!
//! The auth core only talks to the [`UserStore`] and [`SessionStore`] traits.
//! Each operation is atomic on its own; nothing above this layer takes locks
//! over user or session data.
#[cfg(test)]
pub(crate) mod failing;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use canary_common::UserId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{StorageBackend, StorageSettings};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors reported by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique key already exists")]
    Conflict,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC string: algorithm, parameters, salt and digest
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A stored session, keyed by the digest of its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, failing with `Conflict` if the username is taken
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Look a user up by exact username
    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError>;
}

/// Persistence for sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session, failing with `Conflict` if the token key exists
    async fn put(&self, session: &SessionRecord) -> Result<(), StoreError>;

    /// Fetch a session whose owner still exists
    async fn get(&self, token_hash: &str) -> Result<SessionRecord, StoreError>;

    /// Remove a session; removing an unknown key succeeds
    async fn delete(&self, token_hash: &str) -> Result<(), StoreError>;

    /// Remove every session with `expires_at < cutoff` in one atomic step
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Number of stored sessions, expired or not
    async fn count(&self) -> Result<u64, StoreError>;
}

/// Shared handles to the user and session stores
#[derive(Clone)]
pub struct StoreHandles {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl StoreHandles {
    /// Use one backend for both users and sessions
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserStore + SessionStore + 'static,
    {
        Self {
            users: store.clone(),
            sessions: store,
        }
    }

    /// Open the backend named in the settings
    pub fn open(settings: &StorageSettings) -> Result<Self, StoreError> {
        match settings.backend {
            StorageBackend::Memory => Ok(Self::from_store(Arc::new(MemoryStore::new()))),
            StorageBackend::Sqlite => {
                let store = SqliteStore::open(
                    &settings.path,
                    Duration::from_millis(settings.busy_timeout_ms),
                )?;
                Ok(Self::from_store(Arc::new(store)))
            },
        }
    }
}
