// ============================
// canary-backend-lib/src/auth/credentials.rs
// ============================
//! User accounts: creation, lookup and password checks.
use canary_common::UserId;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info};
use zeroize::Zeroizing;

use super::password::PasswordVerifier;
use crate::clock::Clock;
use crate::error::AppError;
use crate::metrics::USER_CREATED;
use crate::storage::{StoreError, User, UserStore};
use crate::validation::{validate_password, validate_username};

/// Credential store over an injected [`UserStore`]
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    verifier: Arc<PasswordVerifier>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(
        users: Arc<dyn UserStore>,
        verifier: Arc<PasswordVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            verifier,
            clock,
        }
    }

    /// Create a user with a freshly hashed password.
    /// Uniqueness is left to the store's unique key.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AppError> {
        validate_username(username)?;
        validate_password(password)?;

        let user = User {
            id: UserId::new_v4(),
            username: username.to_string(),
            password_hash: self.hash(password).await?,
            created_at: self.clock.utc(),
        };

        match self.users.insert_user(&user).await {
            Ok(()) => {
                counter!(USER_CREATED).increment(1);
                info!(user_id = %user.id, "User created");
                Ok(user)
            },
            Err(StoreError::Conflict) => Err(AppError::DuplicateUsername),
            Err(err) => {
                error!("Failed to store new user: {}", err);
                Err(err.into())
            },
        }
    }

    /// Look a user up by exact username
    pub async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.users.find_user_by_username(username).await
    }

    /// Check `password` against `user`'s hash, or against the dummy hash when
    /// there is no user so both paths cost one scrypt evaluation.
    pub async fn verify(&self, user: Option<&User>, password: &str) -> Result<bool, AppError> {
        let verifier = self.verifier.clone();
        let hash = user.map(|u| u.password_hash.clone());
        let plain = Zeroizing::new(password.to_string());

        let matched = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => verifier.verify_password(&hash, &plain),
            None => {
                verifier.verify_dummy(&plain);
                false
            },
        })
        .await?;

        Ok(matched)
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let verifier = self.verifier.clone();
        let plain = Zeroizing::new(password.to_string());

        tokio::task::spawn_blocking(move || verifier.hash_password(&plain))
            .await?
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
    }
}
