//! Authentication extractors for the portal.
//!
//! [`RequireSession`] only checks that someone is signed in. [`RequireAdmin`]
//! and [`RequireAgent`] additionally run the access decision for their
//! dashboard and redirect wherever the guard says.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::debug;

use crate::access::{GuardOutcome, ProtectedArea, Route, guard};
use crate::error::set_sentry_user;
use crate::models::{CurrentSession, session_keys};
use crate::state::AppState;

/// Error returned when a request may not proceed.
#[derive(Debug)]
pub enum AccessRejection {
    /// No session layer or no signed-in user.
    Unauthorized,
    /// The guard sent the user elsewhere.
    Redirect(Route),
    /// Account data is still loading.
    Loading,
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please sign in" })),
            )
                .into_response(),
            Self::Redirect(route) => Redirect::to(&route.path()).into_response(),
            Self::Loading => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}

/// Read the signed-in user, if any.
pub async fn current_session(session: &Session) -> Option<CurrentSession> {
    session
        .get::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user after login.
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_SESSION, current).await
}

/// Drop the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Extractor that requires a signed-in user, whatever their access state.
///
/// Used by the login-surface endpoints (retry, profile setup, registration).
pub struct RequireSession(pub CurrentSession);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AccessRejection::Unauthorized)?;

        current_session(session)
            .await
            .map(Self)
            .ok_or(AccessRejection::Unauthorized)
    }
}

/// Extractor that requires admission to the admin dashboard.
///
/// # Example
///
/// ```rust,ignore
/// async fn overview(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.principal)
/// }
/// ```
pub struct RequireAdmin(pub CurrentSession);

/// Extractor that requires admission to the agent dashboard.
pub struct RequireAgent(pub CurrentSession);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_area(parts, state, ProtectedArea::Admin).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAgent {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_area(parts, state, ProtectedArea::Agent).await.map(Self)
    }
}

/// Resolve access for the signed-in user and apply the guard for `area`.
async fn require_area(
    parts: &Parts,
    state: &AppState,
    area: ProtectedArea,
) -> Result<CurrentSession, AccessRejection> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Err(AccessRejection::Redirect(Route::Login));
    };
    let Some(current) = current_session(session).await else {
        return Err(AccessRejection::Redirect(Route::Login));
    };

    let access = state
        .resolver()
        .resolve(Some(&current.principal), area.login_mode())
        .await;

    match guard(area, &access) {
        GuardOutcome::Allow(_) => {
            set_sentry_user(&current.principal);
            Ok(current)
        }
        GuardOutcome::Redirect(route) => {
            debug!(principal = %current.principal, to = %route, "Guard redirect");
            Err(AccessRejection::Redirect(route))
        }
        GuardOutcome::Wait => Err(AccessRejection::Loading),
    }
}
