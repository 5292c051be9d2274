use async_trait::async_trait;
use canary_common::{SessionInfo, UserId};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::{AuthService, CredentialStore, PasswordVerifier, SessionManager};
use crate::clock::{Clock, DefaultClock};
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::{AUTH_FAILURE, AUTH_SUCCESS};
use crate::storage::{StoreError, StoreHandles, User};

#[derive(Clone)]
pub struct DefaultAuth {
    credentials: CredentialStore,
    sessions: SessionManager,
}

impl DefaultAuth {
    pub fn new(credentials: CredentialStore, sessions: SessionManager) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    /// Wire the service up from settings over already opened stores
    pub fn from_settings(stores: &StoreHandles, settings: &Settings) -> anyhow::Result<Self> {
        Self::with_clock(stores, settings, Arc::new(DefaultClock))
    }

    pub fn with_clock(
        stores: &StoreHandles,
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let verifier = Arc::new(PasswordVerifier::new(settings.password.scrypt_params()?)?);
        let credentials = CredentialStore::new(stores.users.clone(), verifier, clock.clone());
        let sessions =
            SessionManager::from_settings(stores.sessions.clone(), &settings.session).with_clock(clock);
        Ok(Self::new(credentials, sessions))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.sessions.sweep_expired(now).await
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn create_user(&self, username: &str, password: &str) -> Result<User, AppError> {
        self.credentials.create_user(username, password).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = match self.credentials.find_user_by_username(username).await {
            Ok(user) => Some(user),
            Err(StoreError::NotFound) => None,
            Err(err) => {
                error!("User lookup failed: {}", err);
                return Err(err.into());
            },
        };

        // Unknown users still pay for a verification
        let matched = self.credentials.verify(user.as_ref(), password).await?;

        match user {
            Some(user) if matched => {
                counter!(AUTH_SUCCESS).increment(1);
                debug!(user_id = %user.id, "Authenticated");
                Ok(user)
            },
            _ => {
                counter!(AUTH_FAILURE).increment(1);
                debug!("Authentication failed");
                Err(AppError::InvalidCredentials)
            },
        }
    }

    async fn create_session(&self, user_id: UserId, username: &str) -> Result<String, AppError> {
        self.sessions.create_session(user_id, username).await
    }

    async fn validate_session(&self, token: &str) -> Result<SessionInfo, AppError> {
        self.sessions.validate_session(token).await
    }

    async fn end_session(&self, token: &str) -> Result<(), AppError> {
        self.sessions.end_session(token).await
    }
}
