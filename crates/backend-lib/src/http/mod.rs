// ============================
// canary-backend-lib/src/http/mod.rs
// ============================
//! HTTP router.
pub mod cookie;
pub mod handlers;
pub mod negotiate;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use negotiate::{negotiate, RequestFormat};

/// Create the auth router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/api/users", post(handlers::create_user))
        .route("/api/session", get(handlers::current_session))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
