//! Gates for the protected dashboards.
//!
//! A protected page never renders on its own judgement: it asks the access
//! decision for the matching login mode and maps the result here.

use estate_crm_core::{DenialReason, LoginMode};

use super::decision::{AccessState, AdmittedRole};
use super::route::Route;

/// A protected part of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedArea {
    /// Everything under `/admin`.
    Admin,
    /// Everything under `/agent`.
    Agent,
}

impl ProtectedArea {
    /// Login mode the decision is evaluated in for this area.
    #[must_use]
    pub const fn login_mode(self) -> LoginMode {
        match self {
            Self::Admin => LoginMode::Admin,
            Self::Agent => LoginMode::Agent,
        }
    }
}

/// What a protected route does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the page.
    Allow(AdmittedRole),
    /// Send the user elsewhere.
    Redirect(Route),
    /// Account data is still loading; show a spinner.
    Wait,
}

/// Map an access state to the outcome for `area`.
#[must_use]
pub fn guard(area: ProtectedArea, state: &AccessState) -> GuardOutcome {
    match (area, state) {
        (_, AccessState::LoadingAccountData) => GuardOutcome::Wait,
        (_, AccessState::Unauthenticated | AccessState::AccountLoadFailed { .. }) => {
            GuardOutcome::Redirect(Route::Login)
        }
        (_, AccessState::NeedsProfile) => {
            GuardOutcome::Redirect(Route::AccessDenied(DenialReason::NoProfile))
        }

        (
            ProtectedArea::Admin,
            AccessState::Admitted {
                role: AdmittedRole::Admin,
            },
        ) => GuardOutcome::Allow(AdmittedRole::Admin),
        (ProtectedArea::Admin, _) => {
            GuardOutcome::Redirect(Route::AccessDenied(DenialReason::NotAdmin))
        }

        (
            ProtectedArea::Agent,
            AccessState::Admitted {
                role: AdmittedRole::Admin,
            },
        ) => GuardOutcome::Redirect(Route::Admin),
        (
            ProtectedArea::Agent,
            AccessState::Admitted {
                role: AdmittedRole::Agent,
            },
        ) => GuardOutcome::Allow(AdmittedRole::Agent),
        (ProtectedArea::Agent, AccessState::NeedsAgentRegistration) => {
            GuardOutcome::Redirect(Route::AccessDenied(DenialReason::NotAgent))
        }
        (ProtectedArea::Agent, AccessState::Denied { reason }) => {
            GuardOutcome::Redirect(Route::AccessDenied(*reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::access::QueryKind;

    use super::*;

    const ADMIN: AccessState = AccessState::Admitted {
        role: AdmittedRole::Admin,
    };
    const AGENT: AccessState = AccessState::Admitted {
        role: AdmittedRole::Agent,
    };

    fn denied(reason: DenialReason) -> GuardOutcome {
        GuardOutcome::Redirect(Route::AccessDenied(reason))
    }

    #[test]
    fn test_admin_area() {
        use ProtectedArea::Admin;

        assert_eq!(guard(Admin, &ADMIN), GuardOutcome::Allow(AdmittedRole::Admin));
        assert_eq!(guard(Admin, &AGENT), denied(DenialReason::NotAdmin));
        assert_eq!(
            guard(
                Admin,
                &AccessState::Denied {
                    reason: DenialReason::NotAdmin
                }
            ),
            denied(DenialReason::NotAdmin)
        );
        assert_eq!(
            guard(Admin, &AccessState::NeedsProfile),
            denied(DenialReason::NoProfile)
        );
    }

    #[test]
    fn test_agent_area() {
        use ProtectedArea::Agent;

        assert_eq!(guard(Agent, &AGENT), GuardOutcome::Allow(AdmittedRole::Agent));
        assert_eq!(guard(Agent, &ADMIN), GuardOutcome::Redirect(Route::Admin));
        assert_eq!(
            guard(Agent, &AccessState::NeedsProfile),
            denied(DenialReason::NoProfile)
        );
        assert_eq!(
            guard(Agent, &AccessState::NeedsAgentRegistration),
            denied(DenialReason::NotAgent)
        );
        for reason in [
            DenialReason::Pending,
            DenialReason::Rejected,
            DenialReason::Inactive,
        ] {
            assert_eq!(guard(Agent, &AccessState::Denied { reason }), denied(reason));
        }
    }

    #[test]
    fn test_unsettled_states() {
        for area in [ProtectedArea::Admin, ProtectedArea::Agent] {
            assert_eq!(
                guard(area, &AccessState::LoadingAccountData),
                GuardOutcome::Wait
            );
            assert_eq!(
                guard(area, &AccessState::Unauthenticated),
                GuardOutcome::Redirect(Route::Login)
            );
            assert_eq!(
                guard(
                    area,
                    &AccessState::AccountLoadFailed {
                        failed_reads: vec![QueryKind::Profile]
                    }
                ),
                GuardOutcome::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn test_login_mode() {
        assert_eq!(ProtectedArea::Admin.login_mode(), LoginMode::Admin);
        assert_eq!(ProtectedArea::Agent.login_mode(), LoginMode::Agent);
    }
}
