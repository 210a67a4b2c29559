//! Login surface route handlers.
//!
//! Every handler here answers with an [`AccessResponse`]: the resolved
//! access state plus what the login surface should do next.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};

use estate_crm_core::LoginMode;

use crate::access::{AccessState, Navigation, RecoveryAction};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::identity::{LoginRequest, login_with_recovery};
use crate::middleware::{
    RequireSession, clear_current_session, current_session, set_current_session,
};
use crate::models::{AgentRegistrationForm, CurrentSession};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
#[derive(Deserialize)]
pub struct LoginBody {
    pub mode: LoginMode,
    /// Opaque delegation from the browser-side identity flow.
    pub delegation: String,
}

/// Profile setup body.
#[derive(Debug, Deserialize)]
pub struct ProfileBody {
    pub name: String,
}

/// Agent registration body. The photo is base64-encoded.
#[derive(Deserialize)]
pub struct RegistrationBody {
    pub name: String,
    pub mobile: String,
    #[serde(default)]
    pub photo: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Access state as the login surface consumes it.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// Login mode of the session, if signed in.
    pub mode: Option<LoginMode>,
    #[serde(flatten)]
    pub state: AccessState,
    pub navigation: Navigation,
    pub actions: &'static [RecoveryAction],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl AccessResponse {
    fn new(mode: Option<LoginMode>, state: AccessState) -> Self {
        Self {
            mode,
            navigation: state.navigation(),
            actions: state.recovery_actions(),
            message: state.message(),
            state,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Current login surface state.
///
/// Unauthenticated visitors get the sign-in choices; signed-in users get the
/// decision for the mode they logged in with.
pub async fn home(State(state): State<AppState>, session: Session) -> Json<AccessResponse> {
    let Some(current) = current_session(&session).await else {
        return Json(AccessResponse::new(None, AccessState::Unauthenticated));
    };

    let access = state
        .resolver()
        .resolve(Some(&current.principal), current.mode)
        .await;
    Json(AccessResponse::new(Some(current.mode), access))
}

/// Log in through the identity provider and resolve access.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginBody>,
) -> Result<Json<AccessResponse>, AppError> {
    let request = LoginRequest {
        mode: body.mode,
        delegation: SecretString::from(body.delegation),
    };
    let principal = login_with_recovery(state.identity(), &request).await?;

    let current = CurrentSession {
        principal,
        mode: body.mode,
    };
    set_current_session(&session, &current).await?;
    set_sentry_user(&current.principal);
    info!(principal = %current.principal, mode = %current.mode, "User logged in");

    let access = state
        .resolver()
        .resolve(Some(&current.principal), current.mode)
        .await;
    Ok(Json(AccessResponse::new(Some(current.mode), access)))
}

/// Sign out.
///
/// Ends the provider session, drops every cached read for the principal and
/// clears the portal session. Safe to call when already signed out.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    if let Some(current) = current_session(&session).await {
        if let Err(e) = state.identity().logout(&current.principal).await {
            warn!(error = %e, principal = %current.principal, "Identity logout failed");
        }
        state.resolver().invalidate(&current.principal);
        info!(principal = %current.principal, "User logged out");
    }

    clear_current_session(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

/// Re-issue the account reads after a load failure.
pub async fn retry(
    State(state): State<AppState>,
    RequireSession(current): RequireSession,
) -> Json<AccessResponse> {
    let access = state
        .resolver()
        .retry(&current.principal, current.mode)
        .await;
    Json(AccessResponse::new(Some(current.mode), access))
}

/// Create the first-login profile.
pub async fn submit_profile(
    State(state): State<AppState>,
    RequireSession(current): RequireSession,
    Json(body): Json<ProfileBody>,
) -> Result<Json<AccessResponse>, AppError> {
    let access = state
        .resolver()
        .submit_profile(&current.principal, current.mode, &body.name)
        .await?;
    Ok(Json(AccessResponse::new(Some(current.mode), access)))
}

/// Register the signed-in user as an agent.
pub async fn submit_registration(
    State(state): State<AppState>,
    RequireSession(current): RequireSession,
    Json(body): Json<RegistrationBody>,
) -> Result<Json<AccessResponse>, AppError> {
    if current.mode != LoginMode::Agent {
        return Err(AppError::BadRequest(
            "Agent registration requires agent login".to_string(),
        ));
    }

    let photo = BASE64
        .decode(body.photo.trim())
        .map_err(|_| AppError::BadRequest("Profile photo is not valid base64".to_string()))?;

    let form = AgentRegistrationForm {
        name: body.name,
        mobile: body.mobile,
        photo,
    };
    let access = state
        .resolver()
        .submit_registration(&current.principal, form)
        .await?;
    Ok(Json(AccessResponse::new(Some(current.mode), access)))
}
