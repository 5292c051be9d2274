// ============================
// canary-backend-lib/src/storage/failing.rs
// ============================
//! A store whose every call fails, for exercising outage paths.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{SessionRecord, SessionStore, StoreError, User, UserStore};

#[derive(Default)]
pub struct FailingStore {
    sweeps: AtomicU64,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `delete_expired_before` calls seen so far
    pub fn sweep_attempts(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }

    fn down() -> StoreError {
        StoreError::Backend("down".to_string())
    }
}

#[async_trait]
impl UserStore for FailingStore {
    async fn insert_user(&self, _user: &User) -> Result<(), StoreError> {
        Err(Self::down())
    }

    async fn find_user_by_username(&self, _username: &str) -> Result<User, StoreError> {
        Err(Self::down())
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn put(&self, _session: &SessionRecord) -> Result<(), StoreError> {
        Err(Self::down())
    }

    async fn get(&self, _token_hash: &str) -> Result<SessionRecord, StoreError> {
        Err(Self::down())
    }

    async fn delete(&self, _token_hash: &str) -> Result<(), StoreError> {
        Err(Self::down())
    }

    async fn delete_expired_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        Err(Self::down())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(Self::down())
    }
}
