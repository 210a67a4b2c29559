//! Report export commands.
//!
//! # Usage
//!
//! ```bash
//! # Agent logins as CSV, into ./agent-logins.csv
//! crm-cli export agents --principal <admin-principal>
//!
//! # Lead master report to a chosen path
//! crm-cli export leads --principal <admin-principal> --out /tmp/leads.xlsx
//! ```
//!
//! The calls run as `--principal`, so the backend only returns what that
//! principal may read. Use an admin principal for full reports.

use std::path::PathBuf;

use estate_crm_portal::exports::{ExportError, ReportKind, build_report};

use super::{CommandError, connect, parse_principal};

/// Build `kind` and write it to `out`, or to its default file name.
///
/// Nothing is written when there are no records.
pub async fn run(
    kind: ReportKind,
    principal: &str,
    out: Option<PathBuf>,
) -> Result<(), CommandError> {
    let principal = parse_principal(principal)?;
    let backend = connect()?;

    let report = match build_report(&backend, &principal, kind).await {
        Ok(report) => report,
        Err(ExportError::Empty) => {
            tracing::warn!(file = kind.file_name(), "No records to export");
            return Ok(());
        }
        Err(ExportError::Backend(e)) => return Err(e.into()),
    };

    let path = out.unwrap_or_else(|| PathBuf::from(report.file_name));
    tokio::fs::write(&path, report.body.as_bytes()).await?;
    tracing::info!(path = %path.display(), bytes = report.body.len(), "Export written");
    Ok(())
}
