//! Role and status enums for CRM entities.
//!
//! Every enum here travels over the wire in lowercase and is matched
//! exhaustively by the portal. The backend never sends free-form role
//! strings; anything outside the closed set fails to parse.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a variant of a status enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Human-readable name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from one variant table.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Coarse authorization class assigned server-side to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access to agent management, global lists and exports.
    Admin,
    /// A signed-in user; becomes a field agent once registered and approved.
    User,
    /// No privileges.
    Guest,
}

wire_enum!(UserRole, "user role", {
    Admin => "admin",
    User => "user",
    Guest => "guest",
});

/// Approval status of an agent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Registered, awaiting an admin decision.
    #[default]
    Pending,
    /// Approved and allowed into the agent dashboard.
    Active,
    /// Registration refused.
    Rejected,
    /// Previously active, since switched off by an admin.
    Inactive,
}

wire_enum!(AgentStatus, "agent status", {
    Pending => "pending",
    Active => "active",
    Rejected => "rejected",
    Inactive => "inactive",
});

/// Status of a follow-up task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    #[default]
    Pending,
    Completed,
    Overdue,
}

wire_enum!(FollowUpStatus, "follow-up status", {
    Pending => "pending",
    Completed => "completed",
    Overdue => "overdue",
});

/// Whether a lead wants to rent or buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    Rent,
    Sale,
}

wire_enum!(LeadType, "lead type", {
    Rent => "rent",
    Sale => "sale",
});

/// Kind of property a lead wants or an owner lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Commercial,
    House,
    Land,
    Apartment,
}

wire_enum!(PropertyType, "property type", {
    Commercial => "commercial",
    House => "house",
    Land => "land",
    Apartment => "apartment",
});
