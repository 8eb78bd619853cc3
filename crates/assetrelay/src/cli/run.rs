//! `assetrelay run` - select, copy, record, notify

use anyhow::{Context, Result};
use assetrelay_logging::LogConfig;
use assetrelay_transfer::{
    paths, CancellationToken, FilenameDateOracle, JsonLedgerStore, Pipeline, RelayConfig,
    RunReport, RunRequest, RunStatus,
};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Asset name: 8 uppercase letters or digits
    pub asset: String,

    /// Earliest file date to transfer (YYYY/MM/DD, current year only)
    pub date: String,

    /// Configuration file (default: ~/.assetrelay/assetrelay.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ledger file (default: ~/.assetrelay/ledger.json)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs, log_config: &LogConfig) -> Result<ExitCode> {
    // Input is checked before anything touches the filesystem, log files
    // included.
    let request = match RunRequest::parse(&args.asset, &args.date, &FilenameDateOracle::default()) {
        Ok(request) => request,
        Err(status) => return finish(&args, RunReport::from_status(status)),
    };
    crate::start_logging(log_config);

    let config_path = args.config.clone().unwrap_or_else(paths::default_config_path);
    let config = match RelayConfig::load_or_init(&config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(path = %config_path.display(), error = %err, "configuration unavailable");
            return finish(&args, RunReport::from_status(RunStatus::ConfigUnavailable));
        }
    };

    let ledger_path = args.ledger.clone().unwrap_or_else(paths::default_ledger_path);
    let pipeline = match Pipeline::from_config(&config, Box::new(JsonLedgerStore::new(&ledger_path))) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            tracing::error!(error = %err, "configuration rejected");
            return finish(&args, RunReport::from_status(RunStatus::ConfigUnavailable));
        }
    };

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone()).context("Failed to install interrupt handler")?;

    let report = pipeline.run(&request, &cancel);
    finish(&args, report)
}

fn finish(args: &RunArgs, report: RunReport) -> Result<ExitCode> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        println!("{}", report.status);
        if !report.copied.is_empty() {
            println!();
            for path in &report.copied {
                println!("  copied {}", path.display());
            }
        }
        if let Some(date) = report.ledger_date {
            println!("  ledger now at {}", assetrelay_transfer::types::format_date(date));
        }
    }

    Ok(if report.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Cancel the run on SIGINT/SIGTERM (Ctrl+C on Windows). The copy in flight
/// finishes; nothing after it starts.
fn install_interrupt_handler(cancel: CancellationToken) -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        std::thread::spawn(move || {
            if let Some(sig) = signals.forever().next() {
                tracing::warn!(signal = sig, "interrupted, stopping after the current entry");
                cancel.cancel();
            }
        });
    }

    #[cfg(windows)]
    {
        ctrlc::set_handler(move || {
            tracing::warn!("Received Ctrl+C, stopping after the current entry");
            cancel.cancel();
        })?;
    }

    Ok(())
}
