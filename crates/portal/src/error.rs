//! Unified error handling for the portal.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::access::AccessError;
use crate::backend::BackendError;
use crate::exports::ExportError;
use crate::identity::IdentityError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// CRM backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Profile or registration submission failed.
    #[error("{0}")]
    Access(#[from] AccessError),

    /// Export generation failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Status and client-safe message for a backend failure.
fn backend_status(err: &BackendError) -> (StatusCode, String) {
    match err {
        BackendError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")),
        BackendError::Unauthorized => (
            StatusCode::FORBIDDEN,
            "You are not allowed to do that".to_string(),
        ),
        BackendError::AlreadyRegistered => (StatusCode::CONFLICT, err.to_string()),
        BackendError::Request(_)
        | BackendError::Status { .. }
        | BackendError::Decode(_)
        | BackendError::Unavailable(_) => (
            StatusCode::BAD_GATEWAY,
            "External service error".to_string(),
        ),
    }
}

impl AppError {
    /// HTTP status and the message safe to show the client.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Backend(e)
            | Self::Access(AccessError::Backend(e))
            | Self::Export(ExportError::Backend(e)) => backend_status(e),

            Self::Identity(
                IdentityError::Rejected(_)
                | IdentityError::Cancelled
                | IdentityError::InvalidPrincipal(_),
            ) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Identity(_) => (
                StatusCode::BAD_GATEWAY,
                "Identity provider error".to_string(),
            ),

            Self::Access(AccessError::InvalidInput(_) | AccessError::Registration(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            Self::Access(AccessError::UnexpectedState(_) | AccessError::AlreadyRegistered) => {
                (StatusCode::CONFLICT, self.to_string())
            }

            Self::Export(ExportError::Empty) => (StatusCode::NOT_FOUND, self.to_string()),

            Self::Session(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Portal request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context from a principal.
pub fn set_sentry_user(principal: &estate_crm_core::Principal) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(principal.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
