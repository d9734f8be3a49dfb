use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{detection::Gender, expression::Mood};

/// One face's attributes recorded from a single processed frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub age: u32,
    pub gender: Gender,
    pub mood: Mood,
    pub timestamp: DateTime<Utc>,
}
