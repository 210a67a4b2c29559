//! CLI subcommand implementations.

pub mod access;
pub mod export;

use estate_crm_core::{Principal, PrincipalError};
use estate_crm_portal::backend::{BackendError, HttpBackend};
use estate_crm_portal::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The principal argument is malformed.
    #[error("Invalid principal: {0}")]
    Principal(#[from] PrincipalError),

    /// The backend client could not be built or a call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build a backend client from `CRM_BACKEND_URL` and friends.
fn connect() -> Result<HttpBackend, CommandError> {
    let config = BackendConfig::from_env()?;
    tracing::info!(backend = %config.url, "Connecting to CRM backend");
    Ok(HttpBackend::new(&config)?)
}

fn parse_principal(value: &str) -> Result<Principal, CommandError> {
    Ok(Principal::parse(value)?)
}
