//! One run: select, copy, record, notify.

use crate::cancel::CancellationToken;
use crate::config::RelayConfig;
use crate::copier::{CopyProgress, ThrottledCopier};
use crate::error::Result;
use crate::gate::{BacklogGate, DirectoryGate};
use crate::ledger::{LedgerStore, TransferLedger};
use crate::notify::{CommandNotifier, NoopNotifier, Notifier, TransferReport};
use crate::oracle::{DateOracle, FilenameDateOracle};
use crate::selector::{list_source_entries, CandidateSelector};
use crate::status::{RunReport, RunStatus};
use crate::types::{format_date, RunRequest};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Wires the collaborators of a transfer together.
///
/// Runs never return an error: every failure ends up as a [`RunStatus`].
/// Only one run at a time may target a given destination and ledger.
pub struct Pipeline {
    source_dir: PathBuf,
    destination_dir: PathBuf,
    throttle: NonZeroUsize,
    oracle: Box<dyn DateOracle>,
    gate: Box<dyn BacklogGate>,
    ledger_store: Box<dyn LedgerStore>,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    pub fn from_config(config: &RelayConfig, ledger_store: Box<dyn LedgerStore>) -> Result<Self> {
        let notifier: Box<dyn Notifier> = match &config.notify_command {
            Some(argv) => Box::new(CommandNotifier::from_argv(argv)?),
            None => Box::new(NoopNotifier),
        };
        Ok(Self {
            source_dir: config.source_dir.clone(),
            destination_dir: config.destination_dir.clone(),
            throttle: config.throttle()?,
            oracle: Box::new(FilenameDateOracle::new(config.date_source)),
            gate: Box::new(DirectoryGate::new(
                &config.destination_dir,
                &config.processed_marker,
                config.gate_policy(),
            )),
            ledger_store,
            notifier,
        })
    }

    pub fn with_oracle(mut self, oracle: Box<dyn DateOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_gate(mut self, gate: Box<dyn BacklogGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Validate raw input against the oracle's "today", then run.
    pub fn run_raw(&self, asset: &str, date: &str, cancel: &CancellationToken) -> RunReport {
        match RunRequest::parse(asset, date, self.oracle.as_ref()) {
            Ok(request) => self.run(&request, cancel),
            Err(status) => {
                tracing::warn!(asset, date, status = %status, "run rejected");
                RunReport::from_status(status)
            }
        }
    }

    pub fn run(&self, request: &RunRequest, cancel: &CancellationToken) -> RunReport {
        let asset = request.asset();
        tracing::info!(
            asset = %asset,
            requested = %format_date(request.date()),
            source = %self.source_dir.display(),
            destination = %self.destination_dir.display(),
            "starting asset transfer"
        );

        let mut ledger = match TransferLedger::load(self.ledger_store.as_ref()) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::error!(error = %e, "failed to load transfer ledger");
                return RunReport::from_status(RunStatus::LedgerUnavailable);
            }
        };

        let entries = match list_source_entries(&self.source_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, source = %self.source_dir.display(), "failed to list source directory");
                return RunReport::from_status(RunStatus::SourceUnavailable {
                    path: self.source_dir.clone(),
                });
            }
        };

        let candidates =
            CandidateSelector::new(asset, request.date(), self.oracle.as_ref(), &ledger)
                .select(entries);

        let mut report = RunReport::from_status(RunStatus::AssetNotFound);
        report.candidates = candidates.len();
        report.stale_matches = candidates.stale_matches;

        let Some(ledger_date) = candidates.last_accepted else {
            report.status = if candidates.stale_matches > 0 {
                RunStatus::NewerDataExists
            } else {
                RunStatus::AssetNotFound
            };
            tracing::info!(asset = %asset, status = %report.status, "nothing to transfer");
            return report;
        };

        let copier = ThrottledCopier::new(
            &self.destination_dir,
            self.throttle,
            self.gate.as_ref(),
            cancel,
        );
        let mut progress = CopyProgress::default();
        let copy_result = copier.copy_all(&candidates, &mut progress);
        report.copied = progress.copied;
        report.gate_waits = progress.gate_waits;

        if let Err(e) = copy_result {
            tracing::error!(
                asset = %asset,
                error = %e,
                copied = report.copied.len(),
                remaining = candidates.len() - report.copied.len(),
                "transfer aborted; already copied entries stay in the destination"
            );
            report.status = RunStatus::TransferFailed;
            return report;
        }

        if let Err(e) = ledger.write(asset, ledger_date) {
            tracing::error!(asset = %asset, error = %e, "failed to record transfer in ledger");
            report.status = RunStatus::TransferFailed;
            return report;
        }
        report.ledger_date = Some(ledger_date);

        let transfer = TransferReport {
            asset: asset.clone(),
            ledger_date,
            copied: report.copied.clone(),
        };
        report.status = match self.notifier.notify(&transfer) {
            Ok(()) => RunStatus::Transferred {
                asset: asset.clone(),
            },
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "transfer done but notification failed");
                RunStatus::NotificationFailed {
                    asset: asset.clone(),
                }
            }
        };

        tracing::info!(
            asset = %asset,
            copied = report.copied.len(),
            gate_waits = report.gate_waits,
            ledger_date = %format_date(ledger_date),
            "asset transfer finished"
        );
        report
    }
}
