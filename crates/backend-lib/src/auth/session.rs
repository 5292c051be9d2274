// ============================
// canary-backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use canary_common::{SessionInfo, UserId};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::token_generator::{token_digest, SecureTokenGenerator, TokenGenerator};
use crate::clock::{Clock, DefaultClock};
use crate::config::SessionSettings;
use crate::error::AppError;
use crate::metrics::{SESSION_ACTIVE, SESSION_COLLISION, SESSION_CREATED, SESSION_ENDED, SESSION_SWEPT};
use crate::storage::{SessionRecord, SessionStore, StoreError};

/// Session TTL in seconds (30 days)
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Fresh tokens tried before session creation gives up
pub const DEFAULT_MAX_TOKEN_ATTEMPTS: u32 = 3;

/// Session manager for issuing, checking and revoking tokens
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
    ttl: Duration,
    max_token_attempts: u32,
}

impl SessionManager {
    /// Create a session manager with the wall clock and OS-entropy tokens
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            clock: Arc::new(DefaultClock),
            tokens: Arc::new(SecureTokenGenerator),
            ttl: Duration::seconds(SESSION_TTL_SECS as i64),
            max_token_attempts: DEFAULT_MAX_TOKEN_ATTEMPTS,
        }
    }

    pub fn from_settings(store: Arc<dyn SessionStore>, settings: &SessionSettings) -> Self {
        Self::new(store)
            .with_ttl(settings.ttl())
            .with_max_token_attempts(settings.max_token_attempts)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_token_attempts(mut self, attempts: u32) -> Self {
        self.max_token_attempts = attempts.max(1);
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for `user_id` and return its plaintext token.
    /// The token is only ever returned here; the store keeps its digest.
    pub async fn create_session(&self, user_id: UserId, username: &str) -> Result<String, AppError> {
        let created_at = self.clock.utc();
        let expires_at = created_at + self.ttl;

        for attempt in 1..=self.max_token_attempts {
            let token = self.tokens.generate();
            let record = SessionRecord {
                token_hash: token_digest(&token),
                user_id,
                username: username.to_string(),
                created_at,
                expires_at,
            };

            match self.store.put(&record).await {
                Ok(()) => {
                    counter!(SESSION_CREATED).increment(1);
                    info!(user_id = %user_id, "Session created");
                    return Ok(token);
                },
                Err(StoreError::Conflict) => {
                    counter!(SESSION_COLLISION).increment(1);
                    warn!(attempt, "Session token collision, regenerating");
                },
                Err(err) => {
                    error!(user_id = %user_id, "Failed to store session: {}", err);
                    return Err(AppError::SessionCreationFailed);
                },
            }
        }

        error!(
            user_id = %user_id,
            attempts = self.max_token_attempts,
            "Gave up issuing a unique session token"
        );
        Err(AppError::SessionCreationFailed)
    }

    /// Resolve a token to its session. Expired sessions are rejected but left
    /// in place for the sweeper.
    pub async fn validate_session(&self, token: &str) -> Result<SessionInfo, AppError> {
        if token.is_empty() {
            return Err(AppError::InvalidSession);
        }

        let record = match self.store.get(&token_digest(token)).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => {
                debug!("Unknown session token");
                return Err(AppError::InvalidSession);
            },
            Err(err) => {
                error!("Session lookup failed: {}", err);
                return Err(err.into());
            },
        };

        if self.clock.utc() >= record.expires_at {
            debug!(user_id = %record.user_id, "Expired session presented");
            return Err(AppError::InvalidSession);
        }

        Ok(SessionInfo {
            user_id: record.user_id,
            username: record.username,
            created_at: record.created_at,
            expires_at: record.expires_at,
        })
    }

    /// Revoke a session. Unknown or empty tokens are a no-op.
    pub async fn end_session(&self, token: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Ok(());
        }

        self.store.delete(&token_digest(token)).await?;
        counter!(SESSION_ENDED).increment(1);
        debug!("Session ended");
        Ok(())
    }

    /// Delete every session that expired strictly before `now`
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let removed = self.store.delete_expired_before(now).await?;

        if removed > 0 {
            counter!(SESSION_SWEPT).increment(removed);
            info!(removed, "Expired sessions swept");
        }
        if let Ok(remaining) = self.store.count().await {
            gauge!(SESSION_ACTIVE).set(remaining as f64);
        }

        Ok(removed)
    }

    /// Stored sessions, including expired ones not yet swept
    pub async fn session_count(&self) -> Result<u64, AppError> {
        Ok(self.store.count().await?)
    }
}
