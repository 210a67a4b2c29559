//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//! GET  /                             - Login surface state
//!
//! # Auth (login surface)
//! POST /auth/login                   - Exchange a delegation and resolve access
//! POST /auth/logout                  - Sign out (clears session and cached reads)
//! POST /auth/retry                   - Drop cached reads and resolve again
//! POST /auth/profile                 - Create the first-login profile
//! POST /auth/agent-registration      - Register as an agent
//!
//! GET  /access-denied?reason=        - Denial copy for a reason code
//!
//! # Admin (admin guard)
//! GET  /admin                        - Overview counts
//! GET  /admin/agents                 - All agents
//! PUT  /admin/agents/{id}/status     - Approve, reject or deactivate an agent
//! GET  /admin/agent/{id}             - Agent detail
//! GET  /admin/leads                  - All leads
//! GET  /admin/owners                 - All owners
//! GET  /admin/follow-ups             - All follow-ups
//! GET  /admin/exports/agent-logins.csv
//! GET  /admin/exports/lead-master-report.xlsx
//! GET  /admin/exports/customer-owner-report.xlsx
//!
//! # Agent (agent guard)
//! GET  /agent                        - Own record and workload
//! GET|POST        /agent/leads
//! GET|PUT|DELETE  /agent/leads/{id}
//! GET|POST        /agent/owners
//! GET|PUT|DELETE  /agent/owners/{id}
//! GET|POST        /agent/follow-ups
//! PUT|DELETE      /agent/follow-ups/{id}
//! ```

pub mod access_denied;
pub mod admin;
pub mod agent;
pub mod auth;
pub mod exports;
pub mod health;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the login-surface routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/retry", post(auth::retry))
        .route("/profile", post(auth::submit_profile))
        .route("/agent-registration", post(auth::submit_registration))
}

/// Create the admin dashboard routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::overview))
        .route("/agents", get(admin::agents))
        .route("/agents/{id}/status", put(admin::update_agent_status))
        .route("/agent/{id}", get(admin::agent_detail))
        .route("/leads", get(admin::leads))
        .route("/owners", get(admin::owners))
        .route("/follow-ups", get(admin::follow_ups))
        .nest("/exports", export_routes())
}

/// Create the admin export routes router.
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/agent-logins.csv", get(exports::agent_logins))
        .route("/lead-master-report.xlsx", get(exports::lead_master))
        .route("/customer-owner-report.xlsx", get(exports::owner_report))
}

/// Create the agent dashboard routes router.
pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(agent::overview))
        .route("/leads", get(agent::list_leads).post(agent::create_lead))
        .route(
            "/leads/{id}",
            get(agent::show_lead)
                .put(agent::update_lead)
                .delete(agent::delete_lead),
        )
        .route("/owners", get(agent::list_owners).post(agent::create_owner))
        .route(
            "/owners/{id}",
            get(agent::show_owner)
                .put(agent::update_owner)
                .delete(agent::delete_owner),
        )
        .route(
            "/follow-ups",
            get(agent::list_follow_ups).post(agent::create_follow_up),
        )
        .route(
            "/follow-ups/{id}",
            put(agent::update_follow_up).delete(agent::delete_follow_up),
        )
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Login surface
        .route("/", get(auth::home))
        .nest("/auth", auth_routes())
        .route("/access-denied", get(access_denied::show))
        // Dashboards
        .nest("/admin", admin_routes())
        .nest("/agent", agent_routes())
}

/// The portal application with its session layer, ready to serve.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState, secure_cookies: bool) -> Router {
    routes()
        .layer(create_session_layer(secure_cookies))
        .with_state(state)
}
