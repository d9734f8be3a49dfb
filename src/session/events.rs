use serde::Serialize;

use crate::analysis::{FrameAggregate, OverlayItem, SessionSummary};

use super::state::SessionSnapshot;

/// Notifications broadcast to UI observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    #[serde(rename_all = "camelCase")]
    FrameProcessed {
        session_id: String,
        frame_index: u64,
        aggregate: FrameAggregate,
        overlay: Vec<OverlayItem>,
    },
    #[serde(rename_all = "camelCase")]
    PersonDetected { session_id: String, frame_index: u64 },
    #[serde(rename_all = "camelCase")]
    PersonsCleared { session_id: String, frame_index: u64 },
    /// The frame source will produce nothing more; the session keeps running
    /// until stopped.
    #[serde(rename_all = "camelCase")]
    SourceExhausted { session_id: String, frames_processed: u64 },
    SessionCompleted(SessionSummary),
}
