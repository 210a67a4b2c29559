//! Estate CRM CLI - access checks and report exports.
//!
//! # Usage
//!
//! ```bash
//! # Show the access decision for a principal
//! crm-cli access check --principal rrkah-fqaaa-aaaaa-aaaaq-cai --mode agent
//!
//! # Export the agent login sheet
//! crm-cli export agents --principal <admin-principal> --out agents.csv
//!
//! # Export the lead master and owner reports
//! crm-cli export leads --principal <admin-principal>
//! crm-cli export owners --principal <admin-principal>
//! ```
//!
//! # Commands
//!
//! - `access check` - Resolve and print the post-login access decision
//! - `export` - Write one of the admin reports to a file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use estate_crm_core::LoginMode;
use estate_crm_portal::exports::ReportKind;

mod commands;

#[derive(Parser)]
#[command(name = "crm-cli")]
#[command(author, version, about = "Estate CRM CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect access decisions
    Access {
        #[command(subcommand)]
        action: AccessAction,
    },
    /// Export an admin report
    Export {
        /// Report to export (`agents`, `leads`, `owners`)
        report: ReportKind,

        /// Principal the backend calls run as
        #[arg(short, long)]
        principal: String,

        /// Output file (defaults to the report's download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AccessAction {
    /// Resolve the access decision for a principal
    Check {
        /// Principal to check
        #[arg(short, long)]
        principal: String,

        /// Login mode (`admin`, `agent`)
        #[arg(short, long, default_value = "agent")]
        mode: LoginMode,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_crm_cli=info,estate_crm_portal=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Access { action } => match action {
            AccessAction::Check { principal, mode } => {
                commands::access::check(&principal, mode).await?;
            }
        },
        Commands::Export {
            report,
            principal,
            out,
        } => commands::export::run(report, &principal, out).await?,
    }
    Ok(())
}
