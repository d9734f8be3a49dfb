use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session::FrameSink;

use super::loop_worker::frame_loop;
use super::{Detector, FrameSource, LoopSettings};

/// Owns the running frame loop task and its cancellation token.
pub struct CaptureController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn start_capture(
        &mut self,
        session_id: String,
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        sink: FrameSink,
        settings: LoopSettings,
    ) -> Result<()> {
        if self.is_active() {
            bail!("capture already active");
        }
        // A loop that exited on its own leaves a finished handle behind.
        self.handle = None;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(
            session_id.clone(),
            source,
            detector,
            sink,
            settings,
            cancel_token.clone(),
        ));

        info!("Frame loop started for session {session_id}");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Signal the loop to stop scheduling and drop any in-flight detection.
    /// Does not wait for the task; see `stop_capture`.
    pub fn cancel(&self) {
        if let Some(token) = &self.cancel_token {
            token.cancel();
        }
    }

    pub async fn stop_capture(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("frame loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
