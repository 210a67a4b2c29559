//! Admin dashboard route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use estate_crm_core::{AgentStatus, FollowUpStatus, Principal};

use super::agent::{AgentDetail, load_agent_detail};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{AgentRecord, FollowUp, Lead, Owner};
use crate::state::AppState;

/// Headline numbers for the admin overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub total_agents: usize,
    pub pending_agents: usize,
    pub active_agents: usize,
    pub total_leads: usize,
    pub total_owners: usize,
    pub pending_follow_ups: usize,
}

impl AdminOverview {
    /// Tally the overview from full record lists.
    #[must_use]
    pub fn tally(
        agents: &[AgentRecord],
        leads: &[Lead],
        owners: &[Owner],
        follow_ups: &[FollowUp],
    ) -> Self {
        let agents_with =
            |status: AgentStatus| agents.iter().filter(|a| a.status == status).count();
        Self {
            total_agents: agents.len(),
            pending_agents: agents_with(AgentStatus::Pending),
            active_agents: agents_with(AgentStatus::Active),
            total_leads: leads.len(),
            total_owners: owners.len(),
            pending_follow_ups: follow_ups
                .iter()
                .filter(|f| f.status == FollowUpStatus::Pending)
                .count(),
        }
    }
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: AgentStatus,
}

fn parse_agent(id: &str) -> Result<Principal, AppError> {
    Principal::parse(id).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Overview counts.
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminOverview>, AppError> {
    let backend = state.backend();
    let me = &admin.principal;
    let (agents, leads, owners, follow_ups) = tokio::try_join!(
        backend.get_all_agents(me),
        backend.get_all_leads(me),
        backend.get_all_owners(me),
        backend.get_all_follow_ups(me),
    )?;

    Ok(Json(AdminOverview::tally(
        &agents,
        &leads,
        &owners,
        &follow_ups,
    )))
}

/// Every registered agent.
pub async fn agents(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<AgentRecord>>, AppError> {
    Ok(Json(state.backend().get_all_agents(&admin.principal).await?))
}

/// Approve, reject or deactivate an agent.
///
/// Both the agent's and the admin's cached account reads are dropped, so
/// the agent's next request sees the new status.
pub async fn update_agent_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<StatusCode, AppError> {
    let agent = parse_agent(&id)?;
    state
        .resolver()
        .update_agent_status(&admin.principal, &agent, body.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One agent's record with their leads, owners and follow-ups.
pub async fn agent_detail(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<AgentDetail>, AppError> {
    let agent = parse_agent(&id)?;
    Ok(Json(
        load_agent_detail(state.backend(), &admin.principal, &agent).await?,
    ))
}

pub async fn leads(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Lead>>, AppError> {
    Ok(Json(state.backend().get_all_leads(&admin.principal).await?))
}

pub async fn owners(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Owner>>, AppError> {
    Ok(Json(state.backend().get_all_owners(&admin.principal).await?))
}

pub async fn follow_ups(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    Ok(Json(
        state
            .backend()
            .get_all_follow_ups(&admin.principal)
            .await?,
    ))
}
