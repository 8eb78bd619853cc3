//! Asset Relay command line
//!
//! - **run**: select an asset's dated files and deliver them downstream
//! - **ledger**: inspect what has been delivered so far
//! - **config**: create or show the configuration file
//! - **backlog**: check what the downstream processor still has to handle

use anyhow::Result;
use assetrelay_logging::LogConfig;
use assetrelay_transfer::paths;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "assetrelay",
    version,
    about = "Deliver dated asset files to a downstream processor without flooding it"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transfer every new file of an asset dated on or after DATE
    Run(cli::run::RunArgs),

    /// Inspect the transfer ledger
    Ledger {
        #[command(subcommand)]
        action: cli::ledger::LedgerAction,
    },

    /// Create or show the configuration file
    Config {
        #[command(subcommand)]
        action: cli::config::ConfigAction,
    },

    /// List destination entries the downstream processor has not handled yet
    Backlog(cli::backlog::BacklogArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Run(args) => args.json,
        Commands::Ledger { action } => action.wants_json(),
        Commands::Backlog(args) => args.json,
        Commands::Config { .. } => false,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let log_config = LogConfig::new("assetrelay", paths::default_logs_dir()).verbose(cli.verbose);

    match run_command(cli.command, &log_config) {
        Ok(code) => code,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

/// Install the log layers. `run` defers this until its input is valid so a
/// rejected request leaves the home directory untouched.
fn start_logging(log_config: &LogConfig) {
    if let Err(err) = assetrelay_logging::init_logging(log_config) {
        eprintln!("Warning: failed to initialize logging: {err:#}");
    }
}

fn run_command(command: Commands, log_config: &LogConfig) -> Result<ExitCode> {
    if !matches!(command, Commands::Run(_)) {
        start_logging(log_config);
    }
    match command {
        Commands::Run(args) => cli::run::run(args, log_config),
        Commands::Ledger { action } => cli::ledger::run(action).map(|()| ExitCode::SUCCESS),
        Commands::Config { action } => cli::config::run(action).map(|()| ExitCode::SUCCESS),
        Commands::Backlog(args) => cli::backlog::run(args),
    }
}
