//! Property owner domain types.

use serde::{Deserialize, Serialize};

use estate_crm_core::{OwnerId, Principal, PropertyType, Timestamp};

/// A property owner listing a property through an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
    pub mobile: String,
    pub property_type: PropertyType,
    pub location: String,
    pub address: String,
    /// Asking price in whole rupees.
    pub price: u64,
    pub agent_commission: u64,
    pub verification_status: String,
    pub remarks: String,
    pub created_at: Timestamp,
    pub created_by: Principal,
}

/// Fields supplied when creating or updating an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerInput {
    pub name: String,
    pub mobile: String,
    pub property_type: PropertyType,
    pub location: String,
    pub verification_status: String,
    pub price: u64,
    pub agent_commission: u64,
    pub remarks: String,
    pub address: String,
}
