//! The post-login access decision.
//!
//! [`decide`] is a pure function of the caller, the requested dashboard and
//! the settled state of the account reads. It keeps no state of its own, so
//! the same inputs always give the same [`AccessState`].
//!
//! Rules, in priority order once every required read has settled:
//!
//! 1. any required read failed: [`AccessState::AccountLoadFailed`]
//! 2. no profile: [`AccessState::NeedsProfile`]
//! 3. role is admin: admitted as admin, whatever the agent record says
//! 4. admin dashboard requested by a non-admin: denied `not-admin`
//! 5. no agent record: [`AccessState::NeedsAgentRegistration`]
//! 6. otherwise the agent record status decides

use serde::Serialize;

use estate_crm_core::{DenialReason, LoginMode, Principal, UserRole};

use super::cache::QueryKind;
use super::route::Route;
use crate::models::{AgentRecord, UserProfile};

/// Message shown when the account reads could not be completed.
pub const LOAD_FAILED_MESSAGE: &str =
    "Sign-in succeeded, but we could not load your account. Please try again.";

/// Progress of one asynchronous read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadState<T> {
    /// Not issued because the current login mode does not need it.
    NotRequested,
    /// Issued and still in flight.
    Pending,
    /// Completed.
    Loaded(T),
    /// Rejected by the backend or the transport.
    Failed(String),
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        Self::NotRequested
    }
}

impl<T> ReadState<T> {
    /// Build from a completed read.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Settled (or settling) account data for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    pub role: ReadState<UserRole>,
    pub profile: ReadState<Option<UserProfile>>,
    pub agent_record: ReadState<Option<AgentRecord>>,
}

impl AccountSnapshot {
    /// The reads a decision in `mode` has to wait for.
    #[must_use]
    pub const fn required_reads(mode: LoginMode) -> &'static [QueryKind] {
        match mode {
            LoginMode::Admin => &[QueryKind::Role, QueryKind::Profile],
            LoginMode::Agent => &[QueryKind::Role, QueryKind::Profile, QueryKind::AgentRecord],
        }
    }

    const fn is_pending(&self, kind: QueryKind) -> bool {
        match kind {
            QueryKind::Role => self.role.is_pending(),
            QueryKind::Profile => self.profile.is_pending(),
            // NotRequested counts as outstanding once it is required
            QueryKind::AgentRecord => matches!(
                self.agent_record,
                ReadState::Pending | ReadState::NotRequested
            ),
        }
    }

    const fn is_failed(&self, kind: QueryKind) -> bool {
        match kind {
            QueryKind::Role => self.role.is_failed(),
            QueryKind::Profile => self.profile.is_failed(),
            QueryKind::AgentRecord => self.agent_record.is_failed(),
        }
    }
}

/// Which dashboard an admitted user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmittedRole {
    Admin,
    Agent,
}

/// What the user may do from an account-load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryAction {
    /// Re-issue the account reads.
    Retry,
    /// Sign out and start over.
    SignOut,
}

/// Outcome of one evaluation of the access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum AccessState {
    Unauthenticated,
    LoadingAccountData,
    /// One or more required reads failed. Never auto-navigates.
    AccountLoadFailed {
        failed_reads: Vec<QueryKind>,
    },
    NeedsProfile,
    NeedsAgentRegistration,
    Admitted {
        role: AdmittedRole,
    },
    Denied {
        reason: DenialReason,
    },
}

impl AccessState {
    /// Short name for logs and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::LoadingAccountData => "loading-account-data",
            Self::AccountLoadFailed { .. } => "account-load-failed",
            Self::NeedsProfile => "needs-profile",
            Self::NeedsAgentRegistration => "needs-agent-registration",
            Self::Admitted { .. } => "admitted",
            Self::Denied { .. } => "denied",
        }
    }

    /// Where the login surface goes next.
    #[must_use]
    pub fn navigation(&self) -> Navigation {
        match self {
            Self::Unauthenticated | Self::LoadingAccountData | Self::AccountLoadFailed { .. } => {
                Navigation::StayOnLogin
            }
            Self::NeedsProfile => Navigation::ShowProfileSetup,
            Self::NeedsAgentRegistration => Navigation::ShowAgentRegistration,
            Self::Admitted {
                role: AdmittedRole::Admin,
            } => Navigation::NavigateTo(Route::Admin),
            Self::Admitted {
                role: AdmittedRole::Agent,
            } => Navigation::NavigateTo(Route::Agent),
            Self::Denied { reason } => Navigation::NavigateTo(Route::AccessDenied(*reason)),
        }
    }

    /// Actions offered to the user in this state.
    #[must_use]
    pub const fn recovery_actions(&self) -> &'static [RecoveryAction] {
        match self {
            Self::AccountLoadFailed { .. } => &[RecoveryAction::Retry, RecoveryAction::SignOut],
            _ => &[],
        }
    }

    /// User-facing message, if the state carries one.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        match self {
            Self::AccountLoadFailed { .. } => Some(LOAD_FAILED_MESSAGE),
            _ => None,
        }
    }
}

/// What the login surface shows or where it navigates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "to", rename_all = "kebab-case")]
pub enum Navigation {
    StayOnLogin,
    ShowProfileSetup,
    ShowAgentRegistration,
    NavigateTo(Route),
}

/// Decide where `principal` may go when logging in with `mode`.
#[must_use]
pub fn decide(
    principal: Option<&Principal>,
    mode: LoginMode,
    snapshot: &AccountSnapshot,
) -> AccessState {
    if principal.is_none() {
        return AccessState::Unauthenticated;
    }

    let required = AccountSnapshot::required_reads(mode);
    if required.iter().any(|kind| snapshot.is_pending(*kind)) {
        return AccessState::LoadingAccountData;
    }

    let failed_reads: Vec<QueryKind> = required
        .iter()
        .copied()
        .filter(|kind| snapshot.is_failed(*kind))
        .collect();
    if !failed_reads.is_empty() {
        return AccessState::AccountLoadFailed { failed_reads };
    }

    // Every required read is loaded past this point.
    let (Some(role), Some(profile)) = (snapshot.role.loaded(), snapshot.profile.loaded()) else {
        return AccessState::LoadingAccountData;
    };

    if profile.is_none() {
        return AccessState::NeedsProfile;
    }

    match role {
        UserRole::Admin => {
            return AccessState::Admitted {
                role: AdmittedRole::Admin,
            };
        }
        UserRole::User | UserRole::Guest => {}
    }

    if mode == LoginMode::Admin {
        return AccessState::Denied {
            reason: DenialReason::NotAdmin,
        };
    }

    let Some(agent_record) = snapshot.agent_record.loaded() else {
        return AccessState::LoadingAccountData;
    };
    let Some(record) = agent_record else {
        return AccessState::NeedsAgentRegistration;
    };

    match DenialReason::for_agent_status(record.status) {
        Some(reason) => AccessState::Denied { reason },
        None => AccessState::Admitted {
            role: AdmittedRole::Agent,
        },
    }
}
