use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime};

use crate::analysis::summary::{DATE_FORMAT, TIME_FORMAT};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).with_context(|| format!("failed to parse {field}"))
}

pub fn parse_time(value: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_counts_within_range() {
        assert_eq!(to_i64(7).unwrap(), 7);
        assert!(to_i64(u64::MAX).is_err());
        assert_eq!(to_u32(3, "Total male").unwrap(), 3);
        assert!(to_u32(-1, "Total male").is_err());
    }

    #[test]
    fn parses_store_formats() {
        assert_eq!(
            parse_date("2024-03-09", "Date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert_eq!(
            parse_time("07:08:09", "Time").unwrap(),
            NaiveTime::from_hms_opt(7, 8, 9).unwrap()
        );
        assert!(parse_time("7pm", "Time").is_err());
    }
}
