// ================
// common/src/lib.rs
// ================
//! Common types shared between the Canary auth backend and its clients.
//! This module defines the session credential name and the JSON shapes
//! exchanged on the login, user and session endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name under which the session token travels between client and server.
pub const SESSION_COOKIE_NAME: &str = "canary_session";

/// Opaque user identifier
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a fresh random identifier
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username/password pair submitted on login or user creation
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct Credentials {
    /// Account name
    #[serde(default)]
    pub username: String,
    /// Plaintext password
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity attached to a valid session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Owner of the session
    pub user_id: UserId,
    /// Username at the time the session was created
    pub username: String,
    /// When the session was issued
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

/// Success body of `POST /login` for JSON clients
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    /// Always `"true"`
    pub success: String,
}

/// Success body of `POST /api/users`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserCreatedResponse {
    /// Always `"true"`
    pub success: String,
    /// Name of the created account
    pub username: String,
}

/// Error payload returned by every failing JSON endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    /// Error details
    pub error: ErrorDetail,
}

/// Stable code plus human readable message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    /// Machine readable code, e.g. `AUTH_001`
    pub code: String,
    /// Message safe to show to the caller
    pub message: String,
}
