//! Access resolver service.
//!
//! Loads the account reads for a principal (from the cache or the backend,
//! concurrently), runs [`decide`] on the settled result and performs the
//! two one-shot side effects the decision can ask for: creating a profile
//! and registering as an agent.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use estate_crm_core::{AgentStatus, LoginMode, Principal, UserRole};

use super::AccessError;
use super::cache::{AccountCache, CacheValue, QueryKind};
use super::decision::{AccessState, AccountSnapshot, ReadState, decide};
use crate::backend::{BackendError, CrmBackend};
use crate::models::{AgentRecord, AgentRegistration, AgentRegistrationForm, UserProfile};

/// Resolves where a signed-in principal may go.
#[derive(Clone)]
pub struct AccessResolver {
    backend: Arc<dyn CrmBackend>,
    cache: AccountCache,
}

impl AccessResolver {
    /// Create a resolver over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn CrmBackend>, cache: AccountCache) -> Self {
        Self { backend, cache }
    }

    /// Evaluate the access decision for `principal` logging in with `mode`.
    ///
    /// Waits for every read the mode needs before deciding.
    #[instrument(skip(self), fields(principal = ?principal.map(Principal::as_str)))]
    pub async fn resolve(&self, principal: Option<&Principal>, mode: LoginMode) -> AccessState {
        let Some(principal) = principal else {
            return AccessState::Unauthenticated;
        };

        let snapshot = self.snapshot(principal, mode).await;
        let state = decide(Some(principal), mode, &snapshot);
        match &state {
            AccessState::AccountLoadFailed { failed_reads } => {
                warn!(?failed_reads, "Account data could not be loaded");
            }
            other => info!(state = other.name(), "Access resolved"),
        }
        state
    }

    /// Drop cached reads for `principal` and resolve again.
    pub async fn retry(&self, principal: &Principal, mode: LoginMode) -> AccessState {
        self.invalidate(principal);
        self.resolve(Some(principal), mode).await
    }

    /// Forget everything cached for `principal` (logout, mutations).
    pub fn invalidate(&self, principal: &Principal) {
        self.cache.invalidate_principal(principal);
    }

    /// Issue the reads `mode` needs concurrently and wait for all of them.
    pub async fn snapshot(&self, principal: &Principal, mode: LoginMode) -> AccountSnapshot {
        match mode {
            LoginMode::Admin => {
                let (role, profile) = tokio::join!(self.role(principal), self.profile(principal));
                AccountSnapshot {
                    role: ReadState::from_result(role),
                    profile: ReadState::from_result(profile),
                    agent_record: ReadState::NotRequested,
                }
            }
            LoginMode::Agent => {
                let (role, profile, agent_record) = tokio::join!(
                    self.role(principal),
                    self.profile(principal),
                    self.agent_record(principal)
                );
                AccountSnapshot {
                    role: ReadState::from_result(role),
                    profile: ReadState::from_result(profile),
                    agent_record: ReadState::from_result(agent_record),
                }
            }
        }
    }

    /// Create the caller's profile, then resolve again.
    ///
    /// Only valid while the decision is [`AccessState::NeedsProfile`]. The
    /// profile role is the login mode.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InvalidInput` for a blank name,
    /// `AccessError::UnexpectedState` outside `NeedsProfile`, and
    /// `AccessError::Backend` if the save fails. Nothing is invalidated on
    /// failure.
    #[instrument(skip(self, name), fields(principal = %principal, mode = %mode))]
    pub async fn submit_profile(
        &self,
        principal: &Principal,
        mode: LoginMode,
        name: &str,
    ) -> Result<AccessState, AccessError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessError::InvalidInput("Please enter your name"));
        }

        let current = self.resolve(Some(principal), mode).await;
        if current != AccessState::NeedsProfile {
            return Err(AccessError::UnexpectedState(current.name()));
        }

        let profile = UserProfile {
            name: name.to_owned(),
            role: mode,
        };
        self.backend
            .save_caller_user_profile(principal, &profile)
            .await?;
        info!("Profile saved");

        self.invalidate(principal);
        Ok(self.resolve(Some(principal), mode).await)
    }

    /// Register the caller as an agent, then resolve again.
    ///
    /// Only valid on the agent path while the decision is
    /// [`AccessState::NeedsAgentRegistration`]. The form is validated before
    /// anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Registration` for invalid input,
    /// `AccessError::UnexpectedState` outside `NeedsAgentRegistration`,
    /// `AccessError::AlreadyRegistered` if the backend already holds a
    /// record, and `AccessError::Backend` for other failures.
    #[instrument(skip(self, form), fields(principal = %principal))]
    pub async fn submit_registration(
        &self,
        principal: &Principal,
        form: AgentRegistrationForm,
    ) -> Result<AccessState, AccessError> {
        let registration = AgentRegistration::try_from(form)?;

        let current = self.resolve(Some(principal), LoginMode::Agent).await;
        if current != AccessState::NeedsAgentRegistration {
            return Err(AccessError::UnexpectedState(current.name()));
        }

        self.backend
            .register_as_agent(principal, &registration)
            .await
            .map_err(|e| match e {
                BackendError::AlreadyRegistered => AccessError::AlreadyRegistered,
                other => AccessError::Backend(other),
            })?;
        info!("Agent registration submitted");

        self.invalidate(principal);
        Ok(self.resolve(Some(principal), LoginMode::Agent).await)
    }

    /// Change an agent's approval status and drop the stale account reads
    /// of both parties.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the update fails.
    #[instrument(skip(self), fields(admin = %admin, agent = %agent))]
    pub async fn update_agent_status(
        &self,
        admin: &Principal,
        agent: &Principal,
        status: AgentStatus,
    ) -> Result<(), BackendError> {
        self.backend
            .update_agent_status(admin, agent, status)
            .await?;
        self.invalidate(agent);
        self.invalidate(admin);
        info!(%status, "Agent status updated");
        Ok(())
    }

    // =========================================================================
    // Cached reads
    // =========================================================================

    async fn role(&self, principal: &Principal) -> Result<UserRole, BackendError> {
        let ticket = self.cache.begin_read(principal);
        if let Some(CacheValue::Role(role)) = self.cache.get(principal, QueryKind::Role) {
            return Ok(role);
        }
        let role = self.backend.get_caller_user_role(principal).await?;
        self.cache.insert(ticket, CacheValue::Role(role));
        Ok(role)
    }

    async fn profile(&self, principal: &Principal) -> Result<Option<UserProfile>, BackendError> {
        let ticket = self.cache.begin_read(principal);
        if let Some(CacheValue::Profile(profile)) = self.cache.get(principal, QueryKind::Profile) {
            return Ok(profile);
        }
        let profile = self.backend.get_caller_user_profile(principal).await?;
        self.cache.insert(ticket, CacheValue::Profile(profile.clone()));
        Ok(profile)
    }

    async fn agent_record(
        &self,
        principal: &Principal,
    ) -> Result<Option<AgentRecord>, BackendError> {
        let ticket = self.cache.begin_read(principal);
        if let Some(CacheValue::AgentRecord(record)) =
            self.cache.get(principal, QueryKind::AgentRecord)
        {
            return Ok(record);
        }
        let record = match self.backend.get_agent_details(principal, principal).await {
            Ok(record) => Some(record),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        self.cache.insert(ticket, CacheValue::AgentRecord(record.clone()));
        Ok(record)
    }
}
