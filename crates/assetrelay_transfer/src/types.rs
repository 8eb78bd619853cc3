//! Core types for the transfer pipeline

use crate::error::{RelayError, Result};
use crate::oracle::DateOracle;
use crate::status::RunStatus;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;

/// Length every asset name must have.
pub const ASSET_NAME_LEN: usize = 8;

/// Canonical textual date form used on the command line and in the ledger.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

static REQUESTED_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("valid requested date regex"));

// ============================================================================
// Asset name
// ============================================================================

/// Validated asset name: exactly eight uppercase ASCII letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetName(String);

impl AssetName {
    pub fn parse(raw: &str) -> Result<Self> {
        let well_formed = raw.len() == ASSET_NAME_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !well_formed {
            return Err(RelayError::InvalidInput(format!(
                "asset name must be {ASSET_NAME_LEN} uppercase letters or digits, got '{raw}'"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Parse a `YYYY/MM/DD` date. A `-` separator is accepted and normalized.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let normalized = raw.trim().replace('-', "/");
    if !REQUESTED_DATE_RE.is_match(&normalized) {
        return Err(RelayError::InvalidInput(format!(
            "date must look like YYYY/MM/DD, got '{raw}'"
        )));
    }
    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .map_err(|e| RelayError::InvalidInput(format!("'{raw}' is not a calendar date: {e}")))
}

/// Render a date in the canonical `YYYY/MM/DD` form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter storing dates as `YYYY/MM/DD` strings.
pub mod slash_date {
    use super::{format_date, parse_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Run request
// ============================================================================

/// A validated request to deliver one asset from a given date onwards.
///
/// Construction performs no I/O: malformed input and dates outside the
/// current year are rejected before anything touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    asset: AssetName,
    date: NaiveDate,
}

impl RunRequest {
    pub fn parse(
        raw_asset: &str,
        raw_date: &str,
        oracle: &dyn DateOracle,
    ) -> std::result::Result<Self, RunStatus> {
        let (asset, date) = match (AssetName::parse(raw_asset), parse_date(raw_date)) {
            (Ok(asset), Ok(date)) => (asset, date),
            (asset, date) => {
                for err in [asset.err(), date.err()].into_iter().flatten() {
                    tracing::debug!(error = %err, "rejected run input");
                }
                return Err(RunStatus::MalformedInput);
            }
        };

        if !oracle.is_within_current_year(date) {
            return Err(RunStatus::OutsideCurrentYear {
                requested: date,
                current_year: oracle.today().year(),
            });
        }

        Ok(Self { asset, date })
    }

    pub fn asset(&self) -> &AssetName {
        &self.asset
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

// ============================================================================
// Candidates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A source entry accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub date: NaiveDate,
}
