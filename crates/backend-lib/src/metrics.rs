// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_ENDED: &str = "session.ended";
pub const SESSION_SWEPT: &str = "session.swept";
pub const SESSION_ACTIVE: &str = "session.active";
pub const SESSION_COLLISION: &str = "session.collision";
pub const AUTH_SUCCESS: &str = "auth.success";
pub const AUTH_FAILURE: &str = "auth.failure";
pub const USER_CREATED: &str = "user.created";
