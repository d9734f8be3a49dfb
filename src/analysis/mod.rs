pub mod aggregator;
pub mod overlay;
pub mod recorder;
pub mod summary;

pub use aggregator::{Aggregator, DetectionEdge, FrameAggregate, FrameOutcome};
pub use overlay::{OverlayGeometry, OverlayItem};
pub use recorder::SessionRecorder;
pub use summary::{compute_summary, PersistOutcome, SessionSummary, SummaryRecord};
