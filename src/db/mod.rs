mod connection;
pub mod helpers;
mod migrations;
pub mod repositories;

use std::future::Future;

use anyhow::Result;

use crate::analysis::SummaryRecord;

pub use connection::Database;
pub use repositories::StoredSummary;

/// Durable sink for end-of-session summaries. Best effort: callers log
/// failures and never retry.
pub trait PersistenceGateway: Send + Sync + 'static {
    fn insert(&self, record: SummaryRecord) -> impl Future<Output = Result<()>> + Send;
}

impl PersistenceGateway for Database {
    async fn insert(&self, record: SummaryRecord) -> Result<()> {
        self.insert_summary(record).await.map(|_| ())
    }
}
