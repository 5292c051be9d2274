// ============================
// canary-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod credentials;
pub mod password;
pub mod session;
pub mod sweeper;
pub mod token_generator;
mod service;
mod service_impl;

pub use credentials::CredentialStore;
pub use password::PasswordVerifier;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{SessionManager, DEFAULT_MAX_TOKEN_ATTEMPTS, SESSION_TTL_SECS};
pub use sweeper::{SessionSweeper, SweeperHandle};
pub use token_generator::{token_digest, SecureTokenGenerator, TokenGenerator};
