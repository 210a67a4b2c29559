//! The three admin reports.

use std::str::FromStr;

use tracing::{info, instrument};

use estate_crm_core::{ParseEnumError, Principal};

use super::{ExportError, ExportFormat, Report, Table};
use crate::backend::CrmBackend;
use crate::models::{AgentRecord, Lead, Owner};

const AGENT_LOGIN_COLUMNS: &[&str] = &["Name", "Mobile", "Status", "Principal ID"];

const LEAD_MASTER_COLUMNS: &[&str] = &[
    "ID",
    "Name",
    "Mobile",
    "Property Type",
    "Lead Type",
    "Price",
    "Lead Level",
    "Source",
    "Status",
    "Requirements",
    "Created At",
];

const OWNER_REPORT_COLUMNS: &[&str] = &[
    "ID",
    "Name",
    "Mobile",
    "Property Type",
    "Location",
    "Address",
    "Price",
    "Agent Commission",
    "Verification Status",
    "Remarks",
    "Created At",
];

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Every agent with status and principal, as CSV.
    AgentLogins,
    /// Every lead, as a spreadsheet.
    LeadMaster,
    /// Every property owner, as a spreadsheet.
    OwnerReport,
}

impl ReportKind {
    /// Download file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::AgentLogins => "agent-logins.csv",
            Self::LeadMaster => "lead-master-report.xlsx",
            Self::OwnerReport => "customer-owner-report.xlsx",
        }
    }

    #[must_use]
    pub const fn format(self) -> ExportFormat {
        match self {
            Self::AgentLogins => ExportFormat::Csv,
            Self::LeadMaster | Self::OwnerReport => ExportFormat::Excel,
        }
    }
}

impl FromStr for ReportKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agents" | "agent-logins" => Ok(Self::AgentLogins),
            "leads" | "lead-master" => Ok(Self::LeadMaster),
            "owners" | "owner-report" => Ok(Self::OwnerReport),
            _ => Err(ParseEnumError {
                kind: "report",
                value: s.to_owned(),
            }),
        }
    }
}

/// Agent login table.
#[must_use]
pub fn agent_logins(agents: &[AgentRecord]) -> Table {
    let mut table = Table::new(AGENT_LOGIN_COLUMNS);
    for agent in agents {
        table.push_row(vec![
            agent.name.clone(),
            agent.mobile.clone(),
            agent.status.to_string(),
            agent.id.to_string(),
        ]);
    }
    table
}

/// Lead master table.
#[must_use]
pub fn lead_master(leads: &[Lead]) -> Table {
    let mut table = Table::new(LEAD_MASTER_COLUMNS);
    for lead in leads {
        table.push_row(vec![
            lead.id.to_string(),
            lead.name.clone(),
            lead.mobile.clone(),
            lead.property_type.to_string(),
            lead.lead_type.to_string(),
            lead.price.to_string(),
            lead.lead_level.clone(),
            lead.source.clone(),
            lead.status.clone(),
            lead.requirements.clone().unwrap_or_default(),
            lead.created_at.date_string(),
        ]);
    }
    table
}

/// Customer/owner table.
#[must_use]
pub fn owner_report(owners: &[Owner]) -> Table {
    let mut table = Table::new(OWNER_REPORT_COLUMNS);
    for owner in owners {
        table.push_row(vec![
            owner.id.to_string(),
            owner.name.clone(),
            owner.mobile.clone(),
            owner.property_type.to_string(),
            owner.location.clone(),
            owner.address.clone(),
            owner.price.to_string(),
            owner.agent_commission.to_string(),
            owner.verification_status.clone(),
            owner.remarks.clone(),
            owner.created_at.date_string(),
        ]);
    }
    table
}

/// Fetch the source records as `caller` and render `kind`.
///
/// # Errors
///
/// Returns `ExportError::Backend` if the records cannot be loaded and
/// `ExportError::Empty` if there are none.
#[instrument(skip(backend), fields(caller = %caller))]
pub async fn build_report(
    backend: &dyn CrmBackend,
    caller: &Principal,
    kind: ReportKind,
) -> Result<Report, ExportError> {
    let table = match kind {
        ReportKind::AgentLogins => agent_logins(&backend.get_all_agents(caller).await?),
        ReportKind::LeadMaster => lead_master(&backend.get_all_leads(caller).await?),
        ReportKind::OwnerReport => owner_report(&backend.get_all_owners(caller).await?),
    };
    let body = table.render(kind.format())?;
    info!(rows = table.rows().len(), file = kind.file_name(), "Export generated");

    Ok(Report {
        file_name: kind.file_name(),
        format: kind.format(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use estate_crm_core::{AgentStatus, LeadId, LeadType, OwnerId, PropertyType, Timestamp};

    use super::*;

    // 2024-03-15T10:30:00Z
    const CREATED_AT: u64 = 1_710_498_600_000_000_000;

    fn principal() -> Principal {
        Principal::parse("rrkah-fqaaa-aaaaa-aaaaq-cai").unwrap()
    }

    #[test]
    fn test_agent_logins_csv() {
        let agents = vec![AgentRecord {
            id: principal(),
            status: AgentStatus::Active,
            name: "Sharma, Ravi".to_owned(),
            mobile: "+91 98765 43210".to_owned(),
            photo_url: String::new(),
        }];
        let csv = agent_logins(&agents).render(ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "Name,Mobile,Status,Principal ID\n\"Sharma, Ravi\",+91 98765 43210,active,rrkah-fqaaa-aaaaa-aaaaq-cai"
        );
    }

    #[test]
    fn test_lead_master_row() {
        let lead = Lead {
            id: LeadId::new(7),
            name: "Asha".to_owned(),
            mobile: "9876543210".to_owned(),
            property_type: PropertyType::Apartment,
            lead_type: LeadType::Sale,
            price: 4_500_000,
            assigned_agent: principal(),
            lead_level: "hot".to_owned(),
            source: "walk-in".to_owned(),
            status: "open".to_owned(),
            requirements: None,
            created_at: Timestamp::from_nanos(CREATED_AT),
            created_by: principal(),
        };
        let table = lead_master(&[lead]);
        assert_eq!(table.columns().len(), 11);
        assert_eq!(
            table.rows()[0],
            vec![
                "7", "Asha", "9876543210", "apartment", "sale", "4500000", "hot", "walk-in",
                "open", "", "2024-03-15"
            ]
        );
    }

    #[test]
    fn test_owner_report_tsv() {
        let owner = Owner {
            id: OwnerId::new(3),
            name: "Meera".to_owned(),
            mobile: "9000000001".to_owned(),
            property_type: PropertyType::Land,
            location: "Whitefield".to_owned(),
            address: "Plot 12".to_owned(),
            price: 12_000_000,
            agent_commission: 2,
            verification_status: "verified".to_owned(),
            remarks: "corner plot".to_owned(),
            created_at: Timestamp::from_nanos(CREATED_AT),
            created_by: principal(),
        };
        let tsv = owner_report(&[owner]).render(ExportFormat::Excel).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID\tName\tMobile\tProperty Type\tLocation"));
        assert_eq!(
            lines[1],
            "3\tMeera\t9000000001\tland\tWhitefield\tPlot 12\t12000000\t2\tverified\tcorner plot\t2024-03-15"
        );
    }

    #[test]
    fn test_report_kind() {
        assert_eq!("agents".parse::<ReportKind>().unwrap(), ReportKind::AgentLogins);
        assert_eq!("leads".parse::<ReportKind>().unwrap(), ReportKind::LeadMaster);
        assert_eq!("owners".parse::<ReportKind>().unwrap(), ReportKind::OwnerReport);
        assert!("payouts".parse::<ReportKind>().is_err());
        assert_eq!(ReportKind::OwnerReport.file_name(), "customer-owner-report.xlsx");
        assert_eq!(ReportKind::AgentLogins.format(), ExportFormat::Csv);
    }
}
