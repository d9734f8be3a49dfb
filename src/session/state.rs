use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    compute_summary, Aggregator, FrameAggregate, FrameOutcome, PersistOutcome, SessionRecorder,
    SessionSummary,
};
use crate::models::FaceDetection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Stopped,
    Faulted,
}

/// Everything accumulated between one start and the matching stop.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub recorder: SessionRecorder,
    pub last_aggregate: FrameAggregate,
    pub frames_processed: u64,
    pub source_exhausted: bool,
    aggregator: Aggregator,
}

impl Session {
    pub fn new(id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            recorder: SessionRecorder::new(),
            last_aggregate: FrameAggregate::default(),
            frames_processed: 0,
            source_exhausted: false,
            aggregator: Aggregator::new(),
        }
    }
}

/// Lifecycle of the analysis pipeline. The summary only exists once stopped.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running(Session),
    Stopped {
        session: Session,
        summary: SessionSummary,
    },
    Faulted {
        reason: String,
    },
}

/// Summary of a stop that actually ended a running session.
#[derive(Debug, Clone)]
pub struct Finished {
    pub summary: SessionSummary,
    /// Only sessions that recorded something are persisted.
    pub should_persist: bool,
}

/// Read-only view of the controller state for observers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub camera_active: bool,
    pub aggregate: FrameAggregate,
    pub observation_count: usize,
    pub frames_processed: u64,
    pub source_exhausted: bool,
    pub summary: Option<SessionSummary>,
    pub fault: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Running(_) => SessionStatus::Running,
            SessionState::Stopped { .. } => SessionStatus::Stopped,
            SessionState::Faulted { .. } => SessionStatus::Faulted,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }

    /// The frame source is only held while a session runs.
    pub fn camera_active(&self) -> bool {
        self.is_running()
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Running(session) | SessionState::Stopped { session, .. } => Some(session),
            SessionState::Idle | SessionState::Faulted { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        match self {
            SessionState::Stopped { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Discards any previous session (and its visible summary).
    pub fn begin(&mut self, session_id: String, started_at: DateTime<Utc>) {
        *self = SessionState::Running(Session::new(session_id, started_at));
    }

    pub fn fault(&mut self, reason: String) {
        *self = SessionState::Faulted { reason };
    }

    /// Fold one frame into the running session. Returns `None` when the
    /// session is no longer running or `session_id` belongs to an older one.
    pub fn apply_frame(
        &mut self,
        session_id: &str,
        detections: &[FaceDetection],
        timestamp: DateTime<Utc>,
    ) -> Option<FrameOutcome> {
        let SessionState::Running(session) = self else {
            return None;
        };
        if session.id != session_id {
            return None;
        }

        let outcome = session.aggregator.process(detections, timestamp);
        session
            .recorder
            .append(outcome.observations.iter().cloned())
            .ok()?;
        session.last_aggregate = outcome.aggregate;
        session.frames_processed += 1;
        Some(outcome)
    }

    /// Flag the running session's source as drained. Returns the number of
    /// frames processed, or `None` if `session_id` is not the running session.
    pub fn mark_source_exhausted(&mut self, session_id: &str) -> Option<u64> {
        match self {
            SessionState::Running(session) if session.id == session_id => {
                session.source_exhausted = true;
                Some(session.frames_processed)
            }
            _ => None,
        }
    }

    /// Move a running session to `Stopped`, deriving its summary from the
    /// last aggregate. Any other state is left untouched and yields `None`.
    pub fn finish(&mut self, now: DateTime<Local>) -> Option<Finished> {
        let mut session = match std::mem::take(self) {
            SessionState::Running(session) => session,
            other => {
                *self = other;
                return None;
            }
        };

        session.recorder.seal();
        let should_persist = !session.recorder.is_empty();
        let summary = SessionSummary {
            session_id: session.id.clone(),
            record: compute_summary(&session.last_aggregate, now),
            final_mood: session.last_aggregate.mood,
            observation_count: session.recorder.len(),
            persisted: if should_persist {
                PersistOutcome::Pending
            } else {
                PersistOutcome::Skipped
            },
        };

        *self = SessionState::Stopped {
            session,
            summary: summary.clone(),
        };

        Some(Finished {
            summary,
            should_persist,
        })
    }

    pub fn record_persist_outcome(&mut self, session_id: &str, outcome: PersistOutcome) {
        if let SessionState::Stopped { session, summary } = self {
            if session.id == session_id {
                summary.persisted = outcome;
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session();
        SessionSnapshot {
            status: self.status(),
            session_id: session.map(|s| s.id.clone()),
            started_at: session.map(|s| s.started_at),
            camera_active: self.camera_active(),
            aggregate: session.map(|s| s.last_aggregate).unwrap_or_default(),
            observation_count: session.map(|s| s.recorder.len()).unwrap_or(0),
            frames_processed: session.map(|s| s.frames_processed).unwrap_or(0),
            source_exhausted: session.is_some_and(|s| s.source_exhausted),
            summary: self.summary().cloned(),
            fault: match self {
                SessionState::Faulted { reason } => Some(reason.clone()),
                _ => None,
            },
        }
    }
}
