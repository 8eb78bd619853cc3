//! Post-transfer notification.
//!
//! Called once after a run has copied everything and updated the ledger.
//! A failure here is reported but never undoes the transfer.

use crate::error::{RelayError, Result};
use crate::types::{format_date, AssetName};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// What was delivered by a successful run.
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub asset: AssetName,
    pub ledger_date: NaiveDate,
    pub copied: Vec<PathBuf>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, report: &TransferReport) -> Result<()>;
}

/// Does nothing. Used when no notification is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _report: &TransferReport) -> Result<()> {
        Ok(())
    }
}

/// Runs an external command, e.g. a ticketing or mail script.
///
/// The command receives `ASSETRELAY_ASSET`, `ASSETRELAY_DATE` (YYYY/MM/DD)
/// and `ASSETRELAY_FILES` (number of copied entries) in its environment.
/// Spawn failure or a non-zero exit status is a notification failure.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RelayError::Config("notify_command must not be empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, report: &TransferReport) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .env("ASSETRELAY_ASSET", report.asset.as_str())
            .env("ASSETRELAY_DATE", format_date(report.ledger_date))
            .env("ASSETRELAY_FILES", report.copied.len().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RelayError::Notify(format!("failed to run '{}': {e}", self.program)))?;

        if !status.success() {
            return Err(RelayError::Notify(format!(
                "'{}' exited with {status}",
                self.program
            )));
        }
        tracing::info!(asset = %report.asset, program = %self.program, "notification sent");
        Ok(())
    }
}
