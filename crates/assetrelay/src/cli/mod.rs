//! Subcommand implementations

pub mod backlog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod run;
