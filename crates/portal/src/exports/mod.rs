//! Report exports.
//!
//! Two flat text formats:
//!
//! - CSV: header plus rows joined by `\n`, values quoted when they contain
//!   a comma, quote or line break (inner quotes doubled)
//! - "Excel": tab-separated, every line terminated by `\n`, no escaping;
//!   served as `application/vnd.ms-excel` so spreadsheet apps open it
//!
//! An empty table produces no file at all.

mod reports;

use std::fmt::Write as _;

use thiserror::Error;

use crate::backend::BackendError;

pub use reports::{ReportKind, agent_logins, build_report, lead_master, owner_report};

/// Errors that can occur while producing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There are no rows to export.
    #[error("nothing to export")]
    Empty,

    /// Fetching the source records failed.
    #[error("could not load export data: {0}")]
    Backend(#[from] BackendError),
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    /// MIME type the file is served with.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Excel => "application/vnd.ms-excel",
        }
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns.
    #[must_use]
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Values line up with the columns by position.
    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render in `format`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Empty` when the table has no rows.
    pub fn render(&self, format: ExportFormat) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty);
        }
        Ok(match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Excel => self.to_tsv(),
        })
    }

    fn to_csv(&self) -> String {
        let header = self
            .columns
            .iter()
            .map(|c| escape_csv(c))
            .collect::<Vec<_>>()
            .join(",");
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(header);
        for row in &self.rows {
            lines.push(
                row.iter()
                    .map(|v| escape_csv(v))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        lines.join("\n")
    }

    fn to_tsv(&self) -> String {
        let mut out = self.columns.join("\t");
        out.push('\n');
        for row in &self.rows {
            let _ = writeln!(out, "{}", row.join("\t"));
        }
        out
    }
}

/// Quote a CSV value if it needs it.
#[must_use]
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// A rendered export ready to be downloaded or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub file_name: &'static str,
    pub format: ExportFormat,
    pub body: String,
}
