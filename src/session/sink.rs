use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::analysis::{overlay, DetectionEdge, OverlayGeometry};
use crate::models::{FaceDetection, Frame};

use super::events::SessionEvent;
use super::state::SessionState;

/// Commit point for the frame loop: folds detections into the shared session
/// state and notifies observers.
#[derive(Clone)]
pub struct FrameSink {
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    geometry: OverlayGeometry,
}

impl FrameSink {
    pub fn new(
        state: Arc<Mutex<SessionState>>,
        events: broadcast::Sender<SessionEvent>,
        geometry: OverlayGeometry,
    ) -> Self {
        Self {
            state,
            events,
            geometry,
        }
    }

    /// Returns `false` once the session stopped accepting frames; the
    /// detections are then discarded.
    pub async fn commit(
        &self,
        session_id: &str,
        frame: &Frame,
        detections: Vec<FaceDetection>,
        cancel_token: &CancellationToken,
    ) -> bool {
        let outcome = {
            let mut state = self.state.lock().await;
            // Checked under the lock so a concurrent stop either sees this
            // frame fully applied or not at all.
            if cancel_token.is_cancelled() {
                return false;
            }
            match state.apply_frame(session_id, &detections, Utc::now()) {
                Some(outcome) => outcome,
                None => return false,
            }
        };

        match outcome.edge {
            DetectionEdge::Appeared => {
                let _ = self.events.send(SessionEvent::PersonDetected {
                    session_id: session_id.to_string(),
                    frame_index: frame.index(),
                });
            }
            DetectionEdge::Cleared => {
                let _ = self.events.send(SessionEvent::PersonsCleared {
                    session_id: session_id.to_string(),
                    frame_index: frame.index(),
                });
            }
            DetectionEdge::Unchanged => {}
        }

        let items = overlay::layout(frame, &detections, &outcome.observations, &self.geometry);
        let _ = self.events.send(SessionEvent::FrameProcessed {
            session_id: session_id.to_string(),
            frame_index: frame.index(),
            aggregate: outcome.aggregate,
            overlay: items,
        });

        true
    }

    /// Records that the loop ran out of frames and tells observers so.
    pub async fn source_exhausted(&self, session_id: &str, cancel_token: &CancellationToken) {
        let frames_processed = {
            let mut state = self.state.lock().await;
            if cancel_token.is_cancelled() {
                return;
            }
            match state.mark_source_exhausted(session_id) {
                Some(frames_processed) => frames_processed,
                None => return,
            }
        };

        let _ = self.events.send(SessionEvent::SourceExhausted {
            session_id: session_id.to_string(),
            frames_processed,
        });
    }
}
