//! Asset Relay Transfer - Discovery, Selection & Throttled Delivery
//!
//! Finds the dated files of a named asset in a source directory, keeps the
//! ones that are both on/after the requested date and newer than anything
//! already delivered, then copies them into the destination directory read by
//! a downstream batch processor without flooding it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌───────────────┐
//! │   Source    │     │  Candidate  │     │  Throttled  │     │  Destination  │
//! │  directory  │────▶│  Selector   │────▶│   Copier    │────▶│ (downstream)  │
//! │             │     │ (oracle +   │     │ (+ backlog  │     │               │
//! └─────────────┘     │   ledger)   │     │    gate)    │     └───────────────┘
//!                     └─────────────┘     └──────┬──────┘
//!                                                ▼
//!                                   ledger write + notification
//! ```
//!
//! # Core Concepts
//!
//! - **Asset**: 8-character name shared by a family of dated files
//! - **Candidate**: a source entry naming the asset that passes the date checks
//! - **Ledger**: last successfully delivered date per asset
//! - **Backlog**: destination entries the downstream processor has not marked
//!   as processed yet

pub mod cancel;
pub mod config;
pub mod copier;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod notify;
pub mod oracle;
pub mod paths;
pub mod pipeline;
pub mod selector;
pub mod status;
pub mod types;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use config::RelayConfig;
pub use copier::{CopyProgress, ThrottledCopier};
pub use error::{RelayError, Result};
pub use gate::{BacklogGate, DirectoryGate, GatePolicy};
pub use ledger::{JsonLedgerStore, LedgerStore, MemoryLedgerStore, TransferLedger};
pub use notify::{CommandNotifier, NoopNotifier, Notifier, TransferReport};
pub use oracle::{DateOracle, DateSource, FilenameDateOracle};
pub use pipeline::Pipeline;
pub use selector::{list_source_entries, CandidateSelector, CandidateSet, SourceEntry};
pub use status::{RunReport, RunStatus, RunSummary};
pub use types::{AssetName, CandidateEntry, EntryKind, RunRequest};
