//! Live people analysis: per-frame face statistics aggregated into running
//! counters, an observation log and an end-of-session summary.

pub mod analysis;
pub mod capture;
pub mod db;
pub mod models;
pub mod session;
pub mod settings;
mod utils;

pub use analysis::{FrameAggregate, SessionSummary, SummaryRecord};
pub use capture::{CaptureBackend, Detector, FrameSource, ReplayBackend};
pub use db::{Database, PersistenceGateway};
pub use session::{SessionController, SessionEvent, SessionSnapshot, SessionStatus};
pub use settings::{Settings, SettingsStore};
