//! Vocabulary of the post-login access decision.

use serde::{Deserialize, Serialize};

use super::status::{AgentStatus, ParseEnumError};

/// Which dashboard the user asked for on the login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// Administrator dashboard.
    #[default]
    Admin,
    /// Field agent dashboard.
    Agent,
}

impl LoginMode {
    /// Role string written into a freshly created profile.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
        }
    }
}

impl std::fmt::Display for LoginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoginMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            _ => Err(ParseEnumError {
                kind: "login mode",
                value: s.to_owned(),
            }),
        }
    }
}

/// Reason code carried by `/access-denied?reason=...`.
///
/// A denial is a deterministic domain outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialReason {
    /// Admin dashboard requested by a non-admin.
    NotAdmin,
    /// Agent dashboard requested by someone with no agent record.
    NotAgent,
    /// Agent registration awaiting approval.
    Pending,
    /// Agent registration refused.
    Rejected,
    /// Agent switched off by an admin.
    Inactive,
    /// Protected route reached without a saved profile.
    NoProfile,
}

impl DenialReason {
    /// Query-string form of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotAdmin => "not-admin",
            Self::NotAgent => "not-agent",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
            Self::NoProfile => "no-profile",
        }
    }

    /// Denial that an agent record in `status` produces, or `None` for
    /// an active agent.
    #[must_use]
    pub const fn for_agent_status(status: AgentStatus) -> Option<Self> {
        match status {
            AgentStatus::Pending => Some(Self::Pending),
            AgentStatus::Rejected => Some(Self::Rejected),
            AgentStatus::Inactive => Some(Self::Inactive),
            AgentStatus::Active => None,
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DenialReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-admin" => Ok(Self::NotAdmin),
            "not-agent" => Ok(Self::NotAgent),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            "inactive" => Ok(Self::Inactive),
            "no-profile" => Ok(Self::NoProfile),
            _ => Err(ParseEnumError {
                kind: "denial reason",
                value: s.to_owned(),
            }),
        }
    }
}
