use anyhow::Result;
use rusqlite::{params, Row};

use crate::analysis::SummaryRecord;
use crate::db::{
    connection::Database,
    helpers::{parse_date, parse_time, to_i64, to_u32},
};

/// A summary row as stored, with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSummary {
    pub id: i64,
    pub record: SummaryRecord,
}

fn row_to_summary(row: &Row) -> Result<StoredSummary> {
    let date: String = row.get("Date")?;
    let time: String = row.get("Time")?;
    let total_male: i64 = row.get("Total male")?;
    let total_female: i64 = row.get("Total Female")?;

    Ok(StoredSummary {
        id: row.get("id")?,
        record: SummaryRecord {
            date: parse_date(&date, "Date")?,
            total_male: to_u32(total_male, "Total male")?,
            total_female: to_u32(total_female, "Total Female")?,
            time: parse_time(&time, "Time")?,
        },
    })
}

impl Database {
    pub async fn insert_summary(&self, record: SummaryRecord) -> Result<i64> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO analysis (\"Date\", \"Total male\", \"Total Female\", \"Time\")
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.date_string(),
                    to_i64(u64::from(record.total_male))?,
                    to_i64(u64::from(record.total_female))?,
                    record.time_string(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Most recent summaries first.
    pub async fn list_summaries(&self, limit: usize) -> Result<Vec<StoredSummary>> {
        let limit = to_i64(limit as u64)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, \"Date\", \"Total male\", \"Total Female\", \"Time\"
                 FROM analysis
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                summaries.push(row_to_summary(row)?);
            }
            Ok(summaries)
        })
        .await
    }

    pub async fn count_summaries(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM analysis", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
