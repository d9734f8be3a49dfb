pub mod summaries;

pub use summaries::StoredSummary;
