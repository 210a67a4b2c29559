//! Access denied page.

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};

use estate_crm_core::DenialReason;

/// Query parameters of `/access-denied`.
#[derive(Debug, Deserialize)]
pub struct DeniedQuery {
    pub reason: Option<String>,
}

/// Copy shown for a denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialCopy {
    /// The reason code, if it was recognized.
    pub reason: Option<DenialReason>,
    pub title: &'static str,
    pub description: &'static str,
    pub hint: &'static str,
}

impl DenialCopy {
    /// Copy for `reason`. Unknown or missing reasons get the generic text.
    #[must_use]
    pub const fn for_reason(reason: Option<DenialReason>) -> Self {
        let (title, description) = match reason {
            Some(DenialReason::Pending) => (
                "Approval Pending",
                "Your agent registration is under review. You will be notified once approved.",
            ),
            Some(DenialReason::Rejected) => (
                "Access Rejected",
                "Your agent registration has been rejected. Please contact the administrator for more information.",
            ),
            _ => (
                "Access Denied",
                "You do not have permission to access this application. Please contact your administrator.",
            ),
        };
        let hint = match reason {
            Some(DenialReason::Pending) => {
                "Please check back later or contact your administrator for updates on your approval status."
            }
            _ => {
                "If you believe this is an error, please reach out to your system administrator for assistance."
            }
        };

        Self {
            reason,
            title,
            description,
            hint,
        }
    }
}

/// Denial copy for `?reason=`.
pub async fn show(Query(query): Query<DeniedQuery>) -> Json<DenialCopy> {
    let reason = query.reason.as_deref().and_then(|r| r.parse().ok());
    Json(DenialCopy::for_reason(reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_copy() {
        let copy = DenialCopy::for_reason(Some(DenialReason::Pending));
        assert_eq!(copy.title, "Approval Pending");
        assert!(copy.hint.starts_with("Please check back later"));
    }

    #[test]
    fn test_rejected_copy() {
        let copy = DenialCopy::for_reason(Some(DenialReason::Rejected));
        assert_eq!(copy.title, "Access Rejected");
        assert!(copy.hint.starts_with("If you believe this is an error"));
    }

    #[test]
    fn test_default_copy() {
        for reason in [
            None,
            Some(DenialReason::NotAdmin),
            Some(DenialReason::NotAgent),
            Some(DenialReason::Inactive),
            Some(DenialReason::NoProfile),
        ] {
            assert_eq!(DenialCopy::for_reason(reason).title, "Access Denied");
        }
    }
}
