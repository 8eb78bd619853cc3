//! `assetrelay backlog` - one look at the destination, no waiting

use crate::cli::error::HelpfulError;
use anyhow::Result;
use assetrelay_transfer::{paths, DirectoryGate, RelayConfig};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct BacklogArgs {
    /// Configuration file (default: ~/.assetrelay/assetrelay.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct BacklogSummary {
    destination: String,
    marker: String,
    clear: bool,
    pending: Vec<String>,
}

/// Exit status 0 when the destination is clear, 1 while a backlog remains.
pub fn run(args: BacklogArgs) -> Result<ExitCode> {
    let path = args.config.unwrap_or_else(paths::default_config_path);
    let config = RelayConfig::load(&path)
        .map_err(|e| HelpfulError::config_unavailable(&path, &e.to_string()))?;

    let gate = DirectoryGate::new(
        &config.destination_dir,
        &config.processed_marker,
        config.gate_policy(),
    );
    let pending = gate
        .pending_entries()
        .map_err(|e| HelpfulError::destination_unreadable(gate.dir(), &e.to_string()))?;

    let summary = BacklogSummary {
        destination: gate.dir().display().to_string(),
        marker: config.processed_marker.clone(),
        clear: pending.is_empty(),
        pending: pending
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.clear {
        println!("Destination {} is clear", summary.destination);
    } else {
        println!(
            "{} entries in {} are waiting for '{}':",
            summary.pending.len(),
            summary.destination,
            summary.marker
        );
        for name in &summary.pending {
            println!("  {}", name);
        }
    }

    Ok(if summary.clear {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
