//! Run outcome: the single message a run leaves behind.

use crate::types::{format_date, AssetName};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one run. Rendered with `Display` as the status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything copied, ledger updated, notification sent.
    Transferred { asset: AssetName },
    /// Transfer and ledger update done, but the notification failed.
    NotificationFailed { asset: AssetName },
    /// Matches exist but nothing is newer than what was already delivered.
    NewerDataExists,
    /// No matching, date-valid entry in the source directory.
    AssetNotFound,
    /// Asset name or date do not have the required shape.
    MalformedInput,
    OutsideCurrentYear { requested: NaiveDate, current_year: i32 },
    ConfigUnavailable,
    LedgerUnavailable,
    SourceUnavailable { path: PathBuf },
    /// Copy failure, interrupted or timed-out backlog wait, or ledger write
    /// failure. Entries copied before the failure remain in the destination.
    TransferFailed,
}

impl RunStatus {
    /// True only for a clean, fully notified transfer.
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Transferred { .. })
    }

    /// True when files were delivered and the ledger was updated.
    pub fn delivered(&self) -> bool {
        matches!(
            self,
            RunStatus::Transferred { .. } | RunStatus::NotificationFailed { .. }
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Transferred { asset } => {
                write!(f, "The asset {asset} was successfully transferred!")
            }
            RunStatus::NotificationFailed { asset } => write!(
                f,
                "The asset {asset} was transferred, but the notification could not be sent"
            ),
            RunStatus::NewerDataExists => {
                f.write_str("Newer data for this asset already exists downstream")
            }
            RunStatus::AssetNotFound => f.write_str("Requested asset does not exist!"),
            RunStatus::MalformedInput => f.write_str(
                "Requested asset does not exist. Asset names are 8 uppercase letters or digits and dates are YYYY/MM/DD",
            ),
            RunStatus::OutsideCurrentYear {
                requested,
                current_year,
            } => write!(
                f,
                "The requested date {} is not within the current year ({current_year})",
                format_date(*requested)
            ),
            RunStatus::ConfigUnavailable => f.write_str(
                "The configuration file could not be created, or is not properly setup!",
            ),
            RunStatus::LedgerUnavailable => f.write_str("The transfer ledger could not be read"),
            RunStatus::SourceUnavailable { path } => {
                write!(f, "The source directory {} could not be read", path.display())
            }
            RunStatus::TransferFailed => {
                f.write_str("An error has occurred in retrieving the asset")
            }
        }
    }
}

/// Status plus what the run actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub candidates: usize,
    pub stale_matches: usize,
    /// Destination paths copied, in order (including those copied before a
    /// failure).
    pub copied: Vec<PathBuf>,
    pub gate_waits: usize,
    pub ledger_date: Option<NaiveDate>,
}

impl RunReport {
    pub fn from_status(status: RunStatus) -> Self {
        Self {
            status,
            candidates: 0,
            stale_matches: 0,
            copied: Vec::new(),
            gate_waits: 0,
            ledger_date: None,
        }
    }

    /// JSON-friendly view used by the CLI.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status.to_string(),
            success: self.status.is_success(),
            delivered: self.status.delivered(),
            candidates: self.candidates,
            copied: self
                .copied
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            gate_waits: self.gate_waits,
            ledger_date: self.ledger_date.map(format_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: String,
    pub success: bool,
    pub delivered: bool,
    pub candidates: usize,
    pub copied: Vec<String>,
    pub gate_waits: usize,
    pub ledger_date: Option<String>,
}
