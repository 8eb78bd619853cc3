//! Property tests for run input validation

use assetrelay_transfer::types::{format_date, parse_date};
use assetrelay_transfer::{AssetName, DateOracle, FilenameDateOracle, RunRequest, RunStatus};
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

fn oracle() -> FilenameDateOracle {
    FilenameDateOracle::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

proptest! {
    #[test]
    fn well_formed_asset_names_are_accepted(name in "[A-Z0-9]{8}") {
        let asset = AssetName::parse(&name).unwrap();
        prop_assert_eq!(asset.as_str(), name.as_str());
    }

    #[test]
    fn wrong_length_asset_names_are_rejected(name in "[A-Z0-9]{0,7}|[A-Z0-9]{9,12}") {
        prop_assert!(AssetName::parse(&name).is_err());
    }

    #[test]
    fn lowercase_anywhere_is_rejected(
        prefix in "[A-Z0-9]{0,7}",
        lower in "[a-z]",
    ) {
        let mut name = prefix.clone();
        name.push_str(&lower);
        while name.len() < 8 {
            name.push('0');
        }
        prop_assert!(AssetName::parse(&name).is_err());
    }

    #[test]
    fn every_calendar_day_in_current_year_is_accepted(ordinal in 1u32..=366) {
        let date = NaiveDate::from_yo_opt(2024, ordinal).unwrap();
        let slash = format_date(date);
        let dash = slash.replace('/', "-");

        let from_slash = RunRequest::parse("AB123456", &slash, &oracle()).unwrap();
        let from_dash = RunRequest::parse("AB123456", &dash, &oracle()).unwrap();
        prop_assert_eq!(from_slash.date(), date);
        prop_assert_eq!(from_dash.date(), date);
    }

    #[test]
    fn other_years_are_outside_current_year(year in 1900i32..2100, ordinal in 1u32..=365) {
        prop_assume!(year != 2024);
        let date = NaiveDate::from_yo_opt(year, ordinal).unwrap();
        let status = RunRequest::parse("AB123456", &format_date(date), &oracle()).unwrap_err();
        prop_assert_eq!(
            status,
            RunStatus::OutsideCurrentYear { requested: date, current_year: oracle().today().year() }
        );
    }

    #[test]
    fn unpadded_dates_are_malformed(month in 1u32..=9, day in 1u32..=9) {
        let raw = format!("2024/{month}/{day}");
        prop_assert!(parse_date(&raw).is_err());
        prop_assert_eq!(
            RunRequest::parse("AB123456", &raw, &oracle()).unwrap_err(),
            RunStatus::MalformedInput
        );
    }
}
