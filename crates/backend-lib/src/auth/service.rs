use async_trait::async_trait;
use canary_common::{SessionInfo, UserId};

use crate::error::AppError;
use crate::storage::User;

/// Authentication façade used by the HTTP layer
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn create_user(&self, username: &str, password: &str) -> Result<User, AppError>;
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError>;
    async fn create_session(&self, user_id: UserId, username: &str) -> Result<String, AppError>;
    async fn validate_session(&self, token: &str) -> Result<SessionInfo, AppError>;
    async fn end_session(&self, token: &str) -> Result<(), AppError>;

    /// Authenticate, then issue a session token
    async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self.authenticate(username, password).await?;
        self.create_session(user.id, &user.username).await
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.end_session(token).await
    }
}
