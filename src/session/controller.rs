use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Local, Utc};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::{
    analysis::{OverlayGeometry, PersistOutcome, SessionSummary},
    capture::{CaptureBackend, CaptureController, LoopSettings},
    db::PersistenceGateway,
    models::Observation,
    settings::Settings,
};

use super::{
    events::SessionEvent,
    sink::FrameSink,
    state::{SessionSnapshot, SessionState},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 256;

/// Single owner of the session state. Start and stop go through here, and so
/// does every frame the loop commits (via `FrameSink`).
#[derive(Clone)]
pub struct SessionController<P> {
    state: Arc<Mutex<SessionState>>,
    backend: Arc<dyn CaptureBackend>,
    gateway: P,
    capture: Arc<Mutex<CaptureController>>,
    events: broadcast::Sender<SessionEvent>,
    loop_settings: LoopSettings,
    geometry: OverlayGeometry,
}

impl<P: PersistenceGateway + Clone> SessionController<P> {
    pub fn new(backend: Arc<dyn CaptureBackend>, gateway: P, settings: &Settings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            backend,
            gateway,
            capture: Arc::new(Mutex::new(CaptureController::new())),
            events,
            loop_settings: LoopSettings::from_settings(settings),
            geometry: settings.overlay,
        }
    }

    pub fn with_loop_settings(mut self, loop_settings: LoopSettings) -> Self {
        self.loop_settings = loop_settings;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Visible summary; only present after a stop.
    pub async fn summary(&self) -> Option<SessionSummary> {
        self.state.lock().await.summary().cloned()
    }

    pub async fn observations(&self) -> Vec<Observation> {
        self.state
            .lock()
            .await
            .session()
            .map(|session| session.recorder.observations().to_vec())
            .unwrap_or_default()
    }

    pub async fn start(&self) -> Result<SessionSnapshot> {
        {
            let state = self.state.lock().await;
            if state.is_running() {
                bail!("session already running");
            }
        }

        let source = match self.backend.open_source() {
            Ok(source) => source,
            Err(err) => {
                log_error!("Failed to acquire frame source: {err:?}");
                return Err(err.context("failed to acquire frame source"));
            }
        };

        let detector = match self.backend.load_detector() {
            Ok(detector) => detector,
            Err(err) => {
                drop(source);
                log_error!("Failed to load detector: {err:?}");
                let snapshot = {
                    let mut state = self.state.lock().await;
                    state.fault(format!("{err:#}"));
                    state.snapshot()
                };
                self.emit(SessionEvent::StateChanged(snapshot));
                return Err(err.context("failed to load detector"));
            }
        };

        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            if state.is_running() {
                bail!("session already running");
            }
            state.begin(session_id.clone(), Utc::now());
        }

        let sink = FrameSink::new(self.state.clone(), self.events.clone(), self.geometry);
        if let Err(err) = self.capture.lock().await.start_capture(
            session_id.clone(),
            source,
            detector,
            sink,
            self.loop_settings,
        ) {
            self.state.lock().await.fault(format!("{err:#}"));
            return Err(err);
        }

        log_info!("Session {} started", session_id);
        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// End the running session and return its summary. Stopping a session
    /// that is not running changes nothing and returns the current summary.
    pub async fn stop(&self) -> Result<Option<SessionSummary>> {
        // Stop new cycles first so nothing commits after the summary is taken.
        self.capture.lock().await.cancel();

        let finished = {
            let mut state = self.state.lock().await;
            match state.finish(Local::now()) {
                Some(finished) => finished,
                None => return Ok(state.summary().cloned()),
            }
        };

        if let Err(err) = self.capture.lock().await.stop_capture().await {
            log_warn!("Frame loop did not shut down cleanly: {err:?}");
        }

        let mut summary = finished.summary;
        log_info!(
            "Stopping session {}: total male {}, total female {}, mood {}",
            summary.session_id,
            summary.record.total_male,
            summary.record.total_female,
            summary.final_mood
        );

        if finished.should_persist {
            let outcome = match self.gateway.insert(summary.record.clone()).await {
                Ok(()) => {
                    log_info!("Summary for session {} persisted", summary.session_id);
                    PersistOutcome::Saved
                }
                Err(err) => {
                    log_error!("Failed to persist summary for session {}: {err:?}", summary.session_id);
                    PersistOutcome::Failed(format!("{err:#}"))
                }
            };
            self.state
                .lock()
                .await
                .record_persist_outcome(&summary.session_id, outcome.clone());
            summary.persisted = outcome;
        }

        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged(snapshot));
        self.emit(SessionEvent::SessionCompleted(summary.clone()));

        Ok(Some(summary))
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
