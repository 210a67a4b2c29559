//! Session-related types for portal authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use estate_crm_core::{LoginMode, Principal};

/// Session-stored identity.
///
/// Presence of this value in the session is the logged-in flag; the portal
/// never stores role, profile or agent data here (those are re-read through
/// the account cache so that invalidation is honoured).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    /// Principal issued by the identity provider.
    pub principal: Principal,
    /// Dashboard chosen on the login surface.
    pub mode: LoginMode,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in principal and login mode.
    pub const CURRENT_SESSION: &str = "current_session";
}
