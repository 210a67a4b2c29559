//! Agent dashboard route handlers.
//!
//! Every handler requires an active agent. Calls run as the agent, so the
//! backend only ever returns and touches the agent's own records.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use estate_crm_core::{FollowUpId, LeadId, OwnerId, Principal};

use crate::backend::{BackendError, CrmBackend};
use crate::error::AppError;
use crate::middleware::RequireAgent;
use crate::models::{
    AgentRecord, FollowUp, FollowUpInput, Lead, LeadInput, Owner, OwnerInput,
};
use crate::state::AppState;

// =============================================================================
// Types
// =============================================================================

/// An agent's record and everything assigned to them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetail {
    pub agent: AgentRecord,
    pub leads: Vec<Lead>,
    pub owners: Vec<Owner>,
    pub follow_ups: Vec<FollowUp>,
}

/// Load `agent`'s record and workload as `caller`, concurrently.
///
/// # Errors
///
/// Returns the first backend error.
pub async fn load_agent_detail(
    backend: &dyn CrmBackend,
    caller: &Principal,
    agent: &Principal,
) -> Result<AgentDetail, BackendError> {
    let (record, leads, owners, follow_ups) = tokio::try_join!(
        backend.get_agent_details(caller, agent),
        backend.get_agent_leads(caller, agent),
        backend.get_agent_owners(caller, agent),
        backend.get_agent_follow_ups(caller, agent),
    )?;

    Ok(AgentDetail {
        agent: record,
        leads,
        owners,
        follow_ups,
    })
}

/// New follow-up body: the lead plus the editable fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollowUp {
    pub lead_id: LeadId,
    #[serde(flatten)]
    pub input: FollowUpInput,
}

fn created<T: Serialize>(id: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

// =============================================================================
// Overview
// =============================================================================

/// The agent's own record and workload.
pub async fn overview(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<AgentDetail>, AppError> {
    let me = &agent.principal;
    Ok(Json(load_agent_detail(state.backend(), me, me).await?))
}

// =============================================================================
// Leads
// =============================================================================

pub async fn list_leads(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Vec<Lead>>, AppError> {
    let me = &agent.principal;
    Ok(Json(state.backend().get_agent_leads(me, me).await?))
}

pub async fn show_lead(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<LeadId>,
) -> Result<Json<Lead>, AppError> {
    Ok(Json(state.backend().get_lead(&agent.principal, id).await?))
}

/// Create a lead. It is always assigned to the creating agent.
pub async fn create_lead(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(mut input): Json<LeadInput>,
) -> Result<impl IntoResponse, AppError> {
    input.assigned_agent = agent.principal.clone();
    let id = state
        .backend()
        .create_lead(&agent.principal, &input)
        .await?;
    info!(lead_id = %id, agent = %agent.principal, "Lead created");
    Ok(created(id))
}

pub async fn update_lead(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<LeadId>,
    Json(input): Json<LeadInput>,
) -> Result<StatusCode, AppError> {
    state
        .backend()
        .update_lead(&agent.principal, id, &input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_lead(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<LeadId>,
) -> Result<StatusCode, AppError> {
    state.backend().delete_lead(&agent.principal, id).await?;
    info!(lead_id = %id, agent = %agent.principal, "Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Owners
// =============================================================================

pub async fn list_owners(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Vec<Owner>>, AppError> {
    let me = &agent.principal;
    Ok(Json(state.backend().get_agent_owners(me, me).await?))
}

pub async fn show_owner(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<OwnerId>,
) -> Result<Json<Owner>, AppError> {
    Ok(Json(state.backend().get_owner(&agent.principal, id).await?))
}

pub async fn create_owner(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(input): Json<OwnerInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = state
        .backend()
        .create_owner(&agent.principal, &input)
        .await?;
    info!(owner_id = %id, agent = %agent.principal, "Owner created");
    Ok(created(id))
}

pub async fn update_owner(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<OwnerId>,
    Json(input): Json<OwnerInput>,
) -> Result<StatusCode, AppError> {
    state
        .backend()
        .update_owner(&agent.principal, id, &input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_owner(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<OwnerId>,
) -> Result<StatusCode, AppError> {
    state.backend().delete_owner(&agent.principal, id).await?;
    info!(owner_id = %id, agent = %agent.principal, "Owner deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Follow-ups
// =============================================================================

pub async fn list_follow_ups(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    let me = &agent.principal;
    Ok(Json(state.backend().get_agent_follow_ups(me, me).await?))
}

pub async fn create_follow_up(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<NewFollowUp>,
) -> Result<impl IntoResponse, AppError> {
    let id = state
        .backend()
        .create_follow_up(&agent.principal, body.lead_id, &body.input)
        .await?;
    info!(follow_up_id = %id, lead_id = %body.lead_id, "Follow-up created");
    Ok(created(id))
}

pub async fn update_follow_up(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<FollowUpId>,
    Json(input): Json<FollowUpInput>,
) -> Result<StatusCode, AppError> {
    state
        .backend()
        .update_follow_up(&agent.principal, id, &input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_follow_up(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<FollowUpId>,
) -> Result<StatusCode, AppError> {
    state
        .backend()
        .delete_follow_up(&agent.principal, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_follow_up_body() {
        let body: NewFollowUp = serde_json::from_value(json!({
            "leadId": 7,
            "status": "pending",
            "remarks": "site visit",
            "date": 1_710_498_600_000_000_000_u64,
            "priority": "high",
            "taskType": "visit",
            "amount": 0,
        }))
        .unwrap();
        assert_eq!(body.lead_id, LeadId::new(7));
        assert_eq!(body.input.task_type, "visit");
    }
}
