// ============================
// canary-backend-lib/src/storage/memory.rs
// ============================
//! In-process store for tests and single-node deployments without a database.
use async_trait::async_trait;
use canary_common::UserId;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap, DashSet};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

use super::{SessionRecord, SessionStore, StoreError, User, UserStore};

/// Memory-backed implementation of both store traits
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Users keyed by username; the entry API gives an atomic unique insert
    users: Arc<DashMap<String, User>>,
    /// Ids of existing users, for the session/user join
    user_ids: Arc<DashSet<UserId>>,
    /// Sessions keyed by token digest. A single lock so the expiry sweep is
    /// one atomic step.
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn remove_user(&self, username: &str) {
        if let Some((_, user)) = self.users.remove(username) {
            self.user_ids.remove(&user.id);
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                self.user_ids.insert(user.id);
                slot.insert(user.clone());
                Ok(())
            },
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.users
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.token_hash) {
            return Err(StoreError::Conflict);
        }
        sessions.insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token_hash: &str) -> Result<SessionRecord, StoreError> {
        let sessions = self.sessions.read();
        match sessions.get(token_hash) {
            Some(session) if self.user_ids.contains(&session.user_id) => Ok(session.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, token_hash: &str) -> Result<(), StoreError> {
        self.sessions.write().remove(token_hash);
        Ok(())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.sessions.read().len() as u64)
    }
}
