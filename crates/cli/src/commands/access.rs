//! Access decision commands.
//!
//! # Usage
//!
//! ```bash
//! # What would this principal see after logging in as an agent?
//! crm-cli access check --principal rrkah-fqaaa-aaaaa-aaaaq-cai --mode agent
//! ```
//!
//! # Environment Variables
//!
//! - `CRM_BACKEND_URL` - Base URL of the CRM backend
//! - `CRM_API_KEY` - Optional bearer token for the backend

use std::io::Write;
use std::sync::Arc;

use estate_crm_core::LoginMode;
use estate_crm_portal::access::{AccessResolver, AccountCache};
use estate_crm_portal::config::CacheConfig;
use serde_json::json;

use super::{CommandError, connect, parse_principal};

/// Resolve the access decision for `principal` and print it as JSON.
///
/// Runs exactly the reads the portal would, without caching between runs.
pub async fn check(principal: &str, mode: LoginMode) -> Result<(), CommandError> {
    let principal = parse_principal(principal)?;
    let resolver = AccessResolver::new(
        Arc::new(connect()?),
        AccountCache::new(&CacheConfig::default()),
    );

    let state = resolver.resolve(Some(&principal), mode).await;
    tracing::info!(principal = %principal, %mode, state = state.name(), "Access resolved");

    let report = json!({
        "principal": principal,
        "mode": mode,
        "decision": state,
        "navigation": state.navigation(),
        "actions": state.recovery_actions(),
    });
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;
    Ok(())
}
