//! Entry dates: where they come from and how they compare.
//!
//! Asset files carry their production date in the file name, either packed
//! (`AB123456_20240302.dat`) or separated (`AB123456_2024-03-02.dat`).
//! Entries without a recognizable date are not candidates; that is never an
//! error.

use crate::selector::SourceEntry;
use crate::types::AssetName;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separated dates first so `2024-03-02` is read as one token, otherwise
/// maximal digit runs.
static DATE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[-_.]\d{2}[-_.]\d{2}|\d+").expect("valid date token regex"));

/// Where an entry's date is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Only the entry name.
    #[default]
    Name,
    /// The entry name, falling back to the modification date.
    NameOrModified,
}

/// Date extraction and comparison used by candidate selection.
pub trait DateOracle: Send + Sync {
    /// Date encoded by an entry matching `asset`, if any.
    fn extract_date(&self, entry: &SourceEntry, asset: &AssetName) -> Option<NaiveDate>;

    /// The date runs are evaluated against.
    fn today(&self) -> NaiveDate;

    fn is_within_current_year(&self, date: NaiveDate) -> bool {
        date.year() == self.today().year()
    }

    /// The entry must be on or after the requested date.
    fn is_no_older_than(&self, entry_date: NaiveDate, requested: NaiveDate) -> bool {
        entry_date >= requested
    }
}

/// Reads dates from entry names (and optionally modification times).
#[derive(Debug, Clone)]
pub struct FilenameDateOracle {
    source: DateSource,
    today: NaiveDate,
}

impl FilenameDateOracle {
    pub fn new(source: DateSource) -> Self {
        Self {
            source,
            today: Local::now().date_naive(),
        }
    }

    /// Pin "today", e.g. for reproducible runs.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl Default for FilenameDateOracle {
    fn default() -> Self {
        Self::new(DateSource::default())
    }
}

impl DateOracle for FilenameDateOracle {
    fn extract_date(&self, entry: &SourceEntry, asset: &AssetName) -> Option<NaiveDate> {
        if let Some(date) = date_from_name(&entry.name, asset.as_str()) {
            return Some(date);
        }
        match self.source {
            DateSource::Name => None,
            DateSource::NameOrModified => entry
                .modified
                .map(|mtime| DateTime::<Local>::from(mtime).date_naive()),
        }
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// First `YYYYMMDD` token in `name` that is a real calendar date.
///
/// The first occurrence of `asset` is blanked out before searching, so an
/// all-digit asset such as `20240115` is never read as the entry's date.
pub fn date_from_name(name: &str, asset: &str) -> Option<NaiveDate> {
    let remainder = if asset.is_empty() {
        name.to_string()
    } else {
        name.replacen(asset, " ", 1)
    };
    DATE_TOKEN_RE.find_iter(&remainder).find_map(|token| {
        let digits: String = token
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.len() != 8 {
            return None;
        }
        NaiveDate::parse_from_str(&digits, "%Y%m%d").ok()
    })
}
