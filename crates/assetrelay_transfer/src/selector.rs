//! Candidate selection over the source directory.

use crate::error::Result;
use crate::ledger::TransferLedger;
use crate::oracle::DateOracle;
use crate::types::{format_date, AssetName, CandidateEntry, EntryKind};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One top-level entry of the source directory.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub modified: Option<SystemTime>,
}

/// List the immediate children of `dir`, sorted by name.
///
/// Sorting makes the scan order (and therefore the copy order and the date
/// written to the ledger) independent of the platform's directory order.
pub fn list_source_entries(dir: &Path) -> Result<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Symlinks are classified by their target; dangling ones as files.
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(_) => entry.metadata()?,
        };
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(SourceEntry {
            path: entry.path(),
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            modified: metadata.modified().ok(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Entries accepted during one run.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub entries: Vec<CandidateEntry>,
    /// Date of the last accepted entry in scan order. Not necessarily the
    /// maximum; this is the value written to the ledger.
    pub last_accepted: Option<NaiveDate>,
    /// Matching, date-valid entries rejected because the ledger already
    /// holds the same or a later date.
    pub stale_matches: usize,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .count()
    }
}

pub struct CandidateSelector<'a> {
    asset: &'a AssetName,
    requested: NaiveDate,
    oracle: &'a dyn DateOracle,
    ledger: &'a TransferLedger<'a>,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(
        asset: &'a AssetName,
        requested: NaiveDate,
        oracle: &'a dyn DateOracle,
        ledger: &'a TransferLedger<'a>,
    ) -> Self {
        Self {
            asset,
            requested,
            oracle,
            ledger,
        }
    }

    pub fn select(&self, entries: impl IntoIterator<Item = SourceEntry>) -> CandidateSet {
        let mut set = CandidateSet::default();

        for entry in entries {
            if !entry.name.contains(self.asset.as_str()) {
                continue;
            }

            // Unrelated files can share the substring; skip them quietly.
            let Some(date) = self.oracle.extract_date(&entry, self.asset) else {
                tracing::debug!(entry = %entry.name, "no date in matching entry, skipped");
                continue;
            };
            if !self.oracle.is_no_older_than(date, self.requested) {
                tracing::debug!(
                    entry = %entry.name,
                    date = %format_date(date),
                    "entry predates requested date, skipped"
                );
                continue;
            }

            if !self.ledger.is_newer(self.asset, date) {
                tracing::warn!(
                    entry = %entry.name,
                    date = %format_date(date),
                    "newer data for this asset was already delivered"
                );
                set.stale_matches += 1;
                continue;
            }

            tracing::info!(entry = %entry.name, date = %format_date(date), "candidate accepted");
            set.last_accepted = Some(date);
            set.entries.push(CandidateEntry {
                path: entry.path,
                name: entry.name,
                kind: entry.kind,
                date,
            });
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::oracle::FilenameDateOracle;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn file(name: &str) -> SourceEntry {
        SourceEntry {
            path: PathBuf::from("/src").join(name),
            name: name.to_string(),
            kind: EntryKind::File,
            modified: None,
        }
    }

    fn names(set: &CandidateSet) -> Vec<&str> {
        set.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_selects_only_dates_on_or_after_request() {
        let asset = AssetName::parse("AB123456").unwrap();
        let store = MemoryLedgerStore::new();
        let ledger = TransferLedger::load(&store).unwrap();
        let oracle = FilenameDateOracle::default().with_today(day(2024, 6, 1));
        let selector = CandidateSelector::new(&asset, day(2024, 3, 1), &oracle, &ledger);

        let set = selector.select(vec![
            file("AB123456_20240201.dat"),
            file("AB123456_20240301.dat"),
            file("AB123456_20240302.dat"),
            file("CD999999_20240305.dat"),
            file("AB123456_readme.txt"),
        ]);

        assert_eq!(names(&set), vec!["AB123456_20240301.dat", "AB123456_20240302.dat"]);
        assert_eq!(set.last_accepted, Some(day(2024, 3, 2)));
        assert_eq!(set.stale_matches, 0);
    }

    #[test]
    fn test_stale_entries_do_not_stop_the_scan() {
        let asset = AssetName::parse("AB123456").unwrap();
        let store = MemoryLedgerStore::new().with_record("AB123456", day(2024, 3, 2));
        let ledger = TransferLedger::load(&store).unwrap();
        let oracle = FilenameDateOracle::default().with_today(day(2024, 6, 1));
        let selector = CandidateSelector::new(&asset, day(2024, 3, 1), &oracle, &ledger);

        let set = selector.select(vec![
            file("AB123456_20240302.dat"),
            file("AB123456_20240303.dat"),
        ]);

        assert_eq!(names(&set), vec!["AB123456_20240303.dat"]);
        assert_eq!(set.stale_matches, 1);
    }

    #[test]
    fn test_last_accepted_follows_scan_order_not_maximum() {
        let asset = AssetName::parse("AB123456").unwrap();
        let store = MemoryLedgerStore::new();
        let ledger = TransferLedger::load(&store).unwrap();
        let oracle = FilenameDateOracle::default().with_today(day(2024, 6, 1));
        let selector = CandidateSelector::new(&asset, day(2024, 3, 1), &oracle, &ledger);

        let set = selector.select(vec![
            file("AB123456_20240310.dat"),
            file("AB123456_20240305.dat"),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.last_accepted, Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_list_source_entries_sorted_with_kinds() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("b.dat"), "b").unwrap();
        fs::write(temp.path().join("a.dat"), "a").unwrap();
        fs::create_dir(temp.path().join("c_dir")).unwrap();

        let entries = list_source_entries(temp.path()).unwrap();
        let listed: Vec<(&str, EntryKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            listed,
            vec![
                ("a.dat", EntryKind::File),
                ("b.dat", EntryKind::File),
                ("c_dir", EntryKind::Directory),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_list_source_entries_follows_symlinks() {
        let temp = tempfile::TempDir::new().unwrap();
        let real_dir = temp.path().join("real");
        fs::create_dir(&real_dir).unwrap();
        fs::write(real_dir.join("part.dat"), "p").unwrap();

        let source = temp.path().join("source");
        fs::create_dir(&source).unwrap();
        std::os::unix::fs::symlink(&real_dir, source.join("AB123456_20240302")).unwrap();
        std::os::unix::fs::symlink(source.join("missing"), source.join("dangling")).unwrap();

        let entries = list_source_entries(&source).unwrap();
        let listed: Vec<(&str, EntryKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            listed,
            vec![
                ("AB123456_20240302", EntryKind::Directory),
                ("dangling", EntryKind::File),
            ]
        );
    }
}
