//! HTTP middleware for the portal.
//!
//! - [`session`] - in-memory `tower-sessions` layer (SameSite=Strict, 24h)
//! - [`auth`] - extractors that gate the admin and agent dashboards on the
//!   access decision

pub mod auth;
pub mod session;

pub use auth::{
    AccessRejection, RequireAdmin, RequireAgent, RequireSession, clear_current_session,
    current_session, set_current_session,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
