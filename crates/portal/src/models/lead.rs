//! Lead domain types.

use serde::{Deserialize, Serialize};

use estate_crm_core::{LeadId, LeadType, Principal, PropertyType, Timestamp};

/// A prospective buyer or tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub mobile: String,
    pub property_type: PropertyType,
    pub lead_type: LeadType,
    /// Budget in whole rupees.
    pub price: u64,
    pub assigned_agent: Principal,
    /// Free-form temperature label ("hot", "warm", "cold").
    pub lead_level: String,
    pub source: String,
    pub status: String,
    #[serde(default)]
    pub requirements: Option<String>,
    pub created_at: Timestamp,
    pub created_by: Principal,
}

/// Fields supplied when creating or updating a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    pub name: String,
    pub mobile: String,
    pub property_type: PropertyType,
    pub lead_type: LeadType,
    pub price: u64,
    pub assigned_agent: Principal,
    pub lead_level: String,
    pub source: String,
    pub status: String,
    #[serde(default)]
    pub requirements: Option<String>,
}
