//! Follow-up task domain types.

use serde::{Deserialize, Serialize};

use estate_crm_core::{FollowUpId, FollowUpStatus, LeadId, Principal, Timestamp};

/// A scheduled task against a lead (site visit, call back, token payment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: FollowUpId,
    pub lead_id: LeadId,
    pub agent_id: Principal,
    pub status: FollowUpStatus,
    pub date: Timestamp,
    pub priority: String,
    pub task_type: String,
    /// Amount involved (token, deposit), in whole rupees.
    pub amount: u64,
    pub remarks: String,
}

/// Fields supplied when creating or updating a follow-up.
///
/// The lead is fixed at creation and passed separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpInput {
    pub status: FollowUpStatus,
    pub remarks: String,
    pub date: Timestamp,
    pub priority: String,
    pub task_type: String,
    pub amount: u64,
}
