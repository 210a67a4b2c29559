//! Remote CRM backend interface.
//!
//! The backend owns and persists every entity. The portal talks to it
//! through [`CrmBackend`], always on behalf of a caller principal, so the
//! backend can apply its own authorization.
//!
//! - [`HttpBackend`] - JSON RPC over `reqwest`, used in production
//!
//! All operations are asynchronous and fail independently; nothing here
//! retries.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use estate_crm_core::{AgentStatus, FollowUpId, LeadId, OwnerId, Principal, UserRole};

use crate::models::{
    AgentRecord, AgentRegistration, FollowUp, FollowUpInput, Lead, LeadInput, Owner, OwnerInput,
    UserProfile,
};

pub use http::HttpBackend;

/// Errors returned by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport failed.
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with an unexpected status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller has already registered as an agent.
    #[error("already registered as an agent")]
    AlreadyRegistered,

    /// The backend refused the caller.
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    /// The backend is unreachable or refused to serve.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether this error means the entity is absent rather than the read
    /// having failed.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations exposed by the remote CRM backend.
///
/// Every method takes the caller's principal first.
#[async_trait]
pub trait CrmBackend: Send + Sync {
    // =========================================================================
    // Role and profile
    // =========================================================================

    /// Role assigned to the caller.
    async fn get_caller_user_role(&self, caller: &Principal) -> Result<UserRole, BackendError>;

    /// The caller's saved profile, or `None` on first login.
    async fn get_caller_user_profile(
        &self,
        caller: &Principal,
    ) -> Result<Option<UserProfile>, BackendError>;

    /// Create or replace the caller's profile.
    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> Result<(), BackendError>;

    // =========================================================================
    // Agents
    // =========================================================================

    /// Agent record for `agent`; [`BackendError::NotFound`] when the
    /// principal never registered.
    async fn get_agent_details(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<AgentRecord, BackendError>;

    /// Every agent record (admin only).
    async fn get_all_agents(&self, caller: &Principal) -> Result<Vec<AgentRecord>, BackendError>;

    /// Self-register the caller as an agent. New records start pending.
    async fn register_as_agent(
        &self,
        caller: &Principal,
        registration: &AgentRegistration,
    ) -> Result<(), BackendError>;

    /// Change an agent's approval status (admin only).
    async fn update_agent_status(
        &self,
        caller: &Principal,
        agent: &Principal,
        status: AgentStatus,
    ) -> Result<(), BackendError>;

    // =========================================================================
    // Leads
    // =========================================================================

    async fn get_all_leads(&self, caller: &Principal) -> Result<Vec<Lead>, BackendError>;

    async fn get_agent_leads(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Lead>, BackendError>;

    async fn get_lead(&self, caller: &Principal, id: LeadId) -> Result<Lead, BackendError>;

    async fn create_lead(
        &self,
        caller: &Principal,
        input: &LeadInput,
    ) -> Result<LeadId, BackendError>;

    async fn update_lead(
        &self,
        caller: &Principal,
        id: LeadId,
        input: &LeadInput,
    ) -> Result<(), BackendError>;

    async fn delete_lead(&self, caller: &Principal, id: LeadId) -> Result<(), BackendError>;

    // =========================================================================
    // Owners
    // =========================================================================

    async fn get_all_owners(&self, caller: &Principal) -> Result<Vec<Owner>, BackendError>;

    async fn get_agent_owners(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Owner>, BackendError>;

    async fn get_owner(&self, caller: &Principal, id: OwnerId) -> Result<Owner, BackendError>;

    async fn create_owner(
        &self,
        caller: &Principal,
        input: &OwnerInput,
    ) -> Result<OwnerId, BackendError>;

    async fn update_owner(
        &self,
        caller: &Principal,
        id: OwnerId,
        input: &OwnerInput,
    ) -> Result<(), BackendError>;

    async fn delete_owner(&self, caller: &Principal, id: OwnerId) -> Result<(), BackendError>;

    // =========================================================================
    // Follow-ups
    // =========================================================================

    async fn get_all_follow_ups(&self, caller: &Principal) -> Result<Vec<FollowUp>, BackendError>;

    async fn get_agent_follow_ups(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<FollowUp>, BackendError>;

    async fn create_follow_up(
        &self,
        caller: &Principal,
        lead: LeadId,
        input: &FollowUpInput,
    ) -> Result<FollowUpId, BackendError>;

    async fn update_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
        input: &FollowUpInput,
    ) -> Result<(), BackendError>;

    async fn delete_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
    ) -> Result<(), BackendError>;
}
