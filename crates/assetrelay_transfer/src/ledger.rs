//! Transfer ledger: the last successfully delivered date per asset.
//!
//! The ledger is read once at the start of a run and written at most once,
//! after every candidate of the run has been copied.

use crate::error::{RelayError, Result};
use crate::types::{slash_date, AssetName};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const LEDGER_FILE_VERSION: u32 = 1;

/// Durable key/value storage behind the ledger.
pub trait LedgerStore: Send + Sync {
    /// Every recorded asset with its last delivered date.
    fn read_all(&self) -> Result<BTreeMap<String, NaiveDate>>;

    /// Insert or overwrite the record for `asset`.
    fn upsert(&self, asset: &str, date: NaiveDate) -> Result<()>;
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    records: Vec<LedgerRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRecord {
    asset: String,
    #[serde(with = "slash_date")]
    last_transferred: NaiveDate,
}

/// Ledger persisted as a small JSON document.
///
/// A missing file reads as an empty ledger. Writes land in a sibling temp
/// file which is then renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &BTreeMap<String, NaiveDate>) -> Result<()> {
        let file = LedgerFile {
            version: LEDGER_FILE_VERSION,
            records: records
                .iter()
                .map(|(asset, date)| LedgerRecord {
                    asset: asset.clone(),
                    last_transferred: *date,
                })
                .collect(),
        };
        let payload = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn read_all(&self) -> Result<BTreeMap<String, NaiveDate>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let file: LedgerFile = serde_json::from_str(&content).map_err(|e| {
            RelayError::Ledger(format!("{} is not a valid ledger: {e}", self.path.display()))
        })?;
        if file.version != LEDGER_FILE_VERSION {
            return Err(RelayError::Ledger(format!(
                "{} has unsupported version {}",
                self.path.display(),
                file.version
            )));
        }
        Ok(file
            .records
            .into_iter()
            .map(|record| (record.asset, record.last_transferred))
            .collect())
    }

    fn upsert(&self, asset: &str, date: NaiveDate) -> Result<()> {
        let mut records = self.read_all()?;
        records.insert(asset.to_string(), date);
        self.write_all(&records)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Non-persistent store, useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    records: Mutex<BTreeMap<String, NaiveDate>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, asset: &str, date: NaiveDate) -> Self {
        if let Ok(mut records) = self.records.lock() {
            records.insert(asset.to_string(), date);
        }
        self
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn read_all(&self) -> Result<BTreeMap<String, NaiveDate>> {
        let records = self
            .records
            .lock()
            .map_err(|_| RelayError::Ledger("ledger lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn upsert(&self, asset: &str, date: NaiveDate) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RelayError::Ledger("ledger lock poisoned".to_string()))?;
        records.insert(asset.to_string(), date);
        Ok(())
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Snapshot of the store taken at the start of a run.
pub struct TransferLedger<'a> {
    store: &'a dyn LedgerStore,
    records: BTreeMap<String, NaiveDate>,
}

impl<'a> TransferLedger<'a> {
    pub fn load(store: &'a dyn LedgerStore) -> Result<Self> {
        let records = store.read_all()?;
        tracing::debug!(assets = records.len(), "loaded transfer ledger");
        Ok(Self { store, records })
    }

    /// True when nothing was delivered for `asset` yet, or `candidate` is
    /// strictly later than the last delivered date.
    pub fn is_newer(&self, asset: &AssetName, candidate: NaiveDate) -> bool {
        self.last_transferred(asset)
            .map_or(true, |recorded| candidate > recorded)
    }

    pub fn last_transferred(&self, asset: &AssetName) -> Option<NaiveDate> {
        self.records.get(asset.as_str()).copied()
    }

    pub fn write(&mut self, asset: &AssetName, date: NaiveDate) -> Result<()> {
        self.store.upsert(asset.as_str(), date)?;
        self.records.insert(asset.as_str().to_string(), date);
        tracing::info!(asset = %asset, date = %crate::types::format_date(date), "ledger updated");
        Ok(())
    }

    pub fn records(&self) -> &BTreeMap<String, NaiveDate> {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn asset() -> AssetName {
        AssetName::parse("AB123456").unwrap()
    }

    #[test]
    fn test_unknown_asset_is_always_newer() {
        let store = MemoryLedgerStore::new();
        let ledger = TransferLedger::load(&store).unwrap();
        assert!(ledger.is_newer(&asset(), day(1970, 1, 1)));
    }

    #[test]
    fn test_is_newer_is_strict() {
        let store = MemoryLedgerStore::new().with_record("AB123456", day(2024, 3, 2));
        let ledger = TransferLedger::load(&store).unwrap();
        assert!(!ledger.is_newer(&asset(), day(2024, 3, 1)));
        assert!(!ledger.is_newer(&asset(), day(2024, 3, 2)));
        assert!(ledger.is_newer(&asset(), day(2024, 3, 3)));
    }

    #[test]
    fn test_write_goes_through_to_store() {
        let store = MemoryLedgerStore::new();
        let mut ledger = TransferLedger::load(&store).unwrap();
        ledger.write(&asset(), day(2024, 3, 2)).unwrap();
        assert_eq!(ledger.last_transferred(&asset()), Some(day(2024, 3, 2)));
        assert_eq!(store.read_all().unwrap().get("AB123456"), Some(&day(2024, 3, 2)));
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonLedgerStore::new(temp.path().join("ledger.json"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_upsert_overwrites_and_keeps_others() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("ledger.json");
        let store = JsonLedgerStore::new(&path);

        store.upsert("AB123456", day(2024, 3, 2)).unwrap();
        store.upsert("ZZ000001", day(2024, 1, 9)).unwrap();
        store.upsert("AB123456", day(2024, 4, 1)).unwrap();

        let records = JsonLedgerStore::new(&path).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["AB123456"], day(2024, 4, 1));
        assert_eq!(records["ZZ000001"], day(2024, 1, 9));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"2024/04/01\""), "dates stored as YYYY/MM/DD: {raw}");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        fs::write(&path, "not json").unwrap();
        let err = JsonLedgerStore::new(&path).read_all().unwrap_err();
        assert!(matches!(err, RelayError::Ledger(_)), "got {err:?}");
    }
}
