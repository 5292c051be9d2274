// ============================
// canary-backend-lib/src/lib.rs
// ============================
//! Core library for the Canary auth backend: credential storage, password
//! verification, session lifecycle and the HTTP surface around them.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, SessionSweeper};
use crate::config::Settings;
use crate::storage::StoreHandles;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(auth: Arc<dyn AuthService>, settings: Settings) -> Self {
        Self {
            auth,
            settings: Arc::new(settings),
        }
    }

    /// Build the state and a sweeper over the same session store
    pub fn from_settings(
        settings: Settings,
        stores: &StoreHandles,
    ) -> anyhow::Result<(Self, SessionSweeper)> {
        settings.validate()?;
        let auth = DefaultAuth::from_settings(stores, &settings)?;
        let sweeper = SessionSweeper::new(auth.sessions().clone(), settings.session.sweep_interval());
        Ok((Self::new(Arc::new(auth), settings), sweeper))
    }
}
