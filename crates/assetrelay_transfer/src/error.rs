//! Error types for the transfer pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Transfer error type
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to copy '{}': {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Backlog wait cancelled")]
    Cancelled,

    #[error("Destination still holds {pending} unprocessed entries after {waited_secs}s")]
    TimedOut { pending: usize, waited_secs: u64 },

    #[error("Notification failed: {0}")]
    Notify(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
