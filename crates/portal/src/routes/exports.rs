//! Report downloads for the admin export centre.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use estate_crm_core::Principal;

use crate::error::AppError;
use crate::exports::{ExportError, Report, ReportKind, build_report};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

impl IntoResponse for Report {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.format.content_type().to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.file_name),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Build `kind` and serve it as an attachment.
///
/// With no records there is nothing to download, so the answer is
/// `204 No Content`.
async fn download(state: &AppState, admin: &Principal, kind: ReportKind) -> Response {
    match build_report(state.backend(), admin, kind).await {
        Ok(report) => report.into_response(),
        Err(ExportError::Empty) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

pub async fn agent_logins(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Response {
    download(&state, &admin.principal, ReportKind::AgentLogins).await
}

pub async fn lead_master(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Response {
    download(&state, &admin.principal, ReportKind::LeadMaster).await
}

pub async fn owner_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Response {
    download(&state, &admin.principal, ReportKind::OwnerReport).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::exports::ExportFormat;

    use super::*;

    #[test]
    fn test_report_response_headers() {
        let response = Report {
            file_name: "agent-logins.csv",
            format: ExportFormat::Csv,
            body: "Name\nRavi".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"agent-logins.csv\""
        );
    }
}
