//! `assetrelay config` - create or show the configuration file

use crate::cli::error::HelpfulError;
use anyhow::{Context, Result};
use assetrelay_transfer::config::write_template;
use assetrelay_transfer::{paths, RelayConfig};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented configuration template
    Init {
        /// Where to write it (default: ~/.assetrelay/assetrelay.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and print the effective values
    Show {
        /// Configuration file (default: ~/.assetrelay/assetrelay.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { config, force } => init(config, force),
        ConfigAction::Show { config } => show(config),
    }
}

fn init(config: Option<PathBuf>, force: bool) -> Result<()> {
    let path = config.unwrap_or_else(paths::default_config_path);
    if path.exists() && !force {
        return Err(HelpfulError::config_exists(&path).into());
    }
    write_template(&path)
        .with_context(|| format!("Failed to write configuration template: {}", path.display()))?;
    println!("Wrote configuration template to {}", path.display());
    println!("Set source_dir and destination_dir before the first run.");
    Ok(())
}

fn show(config: Option<PathBuf>) -> Result<()> {
    let path = config.unwrap_or_else(paths::default_config_path);
    let config = RelayConfig::load(&path)
        .map_err(|e| HelpfulError::config_unavailable(&path, &e.to_string()))?;

    println!("# {}", path.display());
    println!("source_dir         = {}", config.source_dir.display());
    println!("destination_dir    = {}", config.destination_dir.display());
    println!("throttle_threshold = {}", config.throttle_threshold);
    println!("processed_marker   = {}", config.processed_marker);
    println!("poll_interval_secs = {}", config.poll_interval_secs);
    match config.max_wait_secs {
        Some(secs) => println!("max_wait_secs      = {}", secs),
        None => println!("max_wait_secs      = (wait forever)"),
    }
    println!("date_source        = {:?}", config.date_source);
    match &config.notify_command {
        Some(argv) => println!("notify_command     = {}", argv.join(" ")),
        None => println!("notify_command     = (none)"),
    }
    Ok(())
}
