//! `assetrelay ledger` - inspect delivered dates

use crate::cli::error::HelpfulError;
use anyhow::Result;
use assetrelay_transfer::types::format_date;
use assetrelay_transfer::{paths, JsonLedgerStore, LedgerStore};
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum LedgerAction {
    /// List the last delivered date of every asset
    List {
        /// Ledger file (default: ~/.assetrelay/ledger.json)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl LedgerAction {
    pub fn wants_json(&self) -> bool {
        match self {
            LedgerAction::List { json, .. } => *json,
        }
    }
}

#[derive(Debug, Serialize)]
struct LedgerRow {
    asset: String,
    last_transferred: String,
}

pub fn run(action: LedgerAction) -> Result<()> {
    match action {
        LedgerAction::List { ledger, json } => list(ledger, json),
    }
}

fn list(ledger: Option<PathBuf>, json: bool) -> Result<()> {
    let path = ledger.unwrap_or_else(paths::default_ledger_path);
    let records = JsonLedgerStore::new(&path)
        .read_all()
        .map_err(|e| HelpfulError::ledger_unreadable(&path, &e.to_string()))?;

    let rows: Vec<LedgerRow> = records
        .into_iter()
        .map(|(asset, date)| LedgerRow {
            asset,
            last_transferred: format_date(date),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No transfers recorded in {}", path.display());
        return Ok(());
    }

    println!("{:<10} LAST TRANSFERRED", "ASSET");
    for row in &rows {
        println!("{:<10} {}", row.asset, row.last_transferred);
    }
    Ok(())
}
