//! End-of-session summary.
//!
//! Totals are copied from the last processed frame, not accumulated over the
//! observation log. Stores built against the existing `analysis` schema rely
//! on that meaning, and on the exact field names of `SummaryRecord`.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::aggregator::FrameAggregate;
use crate::models::Mood;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// The persisted end-of-session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "Date", with = "date_format")]
    pub date: NaiveDate,
    #[serde(rename = "Total male")]
    pub total_male: u32,
    #[serde(rename = "Total Female")]
    pub total_female: u32,
    #[serde(rename = "Time", with = "time_format")]
    pub time: NaiveTime,
}

impl SummaryRecord {
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_string(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// Outcome of handing the record to the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum PersistOutcome {
    /// Nothing was observed during the session.
    Skipped,
    Pending,
    Saved,
    Failed(String),
}

/// What the summary view shows once a session has stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub record: SummaryRecord,
    pub final_mood: Mood,
    pub observation_count: usize,
    pub persisted: PersistOutcome,
}

/// Derive the summary record at stop time from the last frame aggregate.
pub fn compute_summary(last_aggregate: &FrameAggregate, now: DateTime<Local>) -> SummaryRecord {
    let time = now.time();
    SummaryRecord {
        date: now.date_naive(),
        total_male: last_aggregate.male_count,
        total_female: last_aggregate.female_count,
        time: time.with_nanosecond(0).unwrap_or(time),
    }
}

mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
