use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{FaceDetection, Frame};
use crate::session::FrameSink;

use super::{Detector, FrameSource, LoopSettings};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Drives one detection cycle per refresh tick until cancelled.
///
/// The next cycle is only considered after the current detection returns, so
/// slow inference stretches the cadence instead of queueing work. Missed
/// ticks are delayed, not replayed in a burst. The loop ends on cancellation
/// or once the source reports it is exhausted.
pub async fn frame_loop(
    session_id: String,
    mut source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    sink: FrameSink,
    settings: LoopSettings,
    cancel_token: CancellationToken,
) {
    let detector = Arc::new(Mutex::new(detector));
    let mut ticker = time::interval(settings.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => break,
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) if frame.is_valid() => frame,
            Ok(None) if source.is_exhausted() => {
                log_info!("frame source for session {} exhausted", session_id);
                sink.source_exhausted(&session_id, &cancel_token).await;
                break;
            }
            Ok(_) => continue,
            Err(err) => {
                log_warn!("frame source failed for session {}: {err:?}", session_id);
                continue;
            }
        };

        // Only one detection is ever outstanding: a slow call is reported and
        // then awaited to completion before the next tick is considered.
        let detection = run_detection(&detector, frame.clone());
        tokio::pin!(detection);
        let slow_warning = time::sleep(settings.slow_detection_warning);
        tokio::pin!(slow_warning);
        let mut warned = false;

        let result = loop {
            tokio::select! {
                result = &mut detection => break Some(result),
                _ = &mut slow_warning, if !warned => {
                    warned = true;
                    log_warn!(
                        "detection on frame {} for session {} still running after {}ms",
                        frame.index(),
                        session_id,
                        settings.slow_detection_warning.as_millis()
                    );
                }
                _ = cancel_token.cancelled() => break None,
            }
        };

        let detections = match result {
            Some(Ok(detections)) => detections,
            Some(Err(err)) => {
                log_warn!("detection failed on frame {} for session {}: {err:?}", frame.index(), session_id);
                continue;
            }
            None => {
                log_debug!("dropping in-flight detection for frame {}", frame.index());
                break;
            }
        };

        let face_count = detections.len();
        if !sink.commit(&session_id, &frame, detections, &cancel_token).await {
            log_debug!("session {} no longer accepts frames; discarded frame {}", session_id, frame.index());
            break;
        }

        if settings.verbose {
            log_info!("frame {} committed with {} face(s)", frame.index(), face_count);
        }
    }

    log_info!("frame loop for session {} shutting down", session_id);
}

async fn run_detection(detector: &Arc<Mutex<Box<dyn Detector>>>, frame: Frame) -> Result<Vec<FaceDetection>> {
    let detector = Arc::clone(detector);
    tokio::task::spawn_blocking(move || {
        let mut guard = detector
            .lock()
            .map_err(|_| anyhow!("detector lock poisoned"))?;
        guard.detect(&frame)
    })
    .await
    .context("detector worker join failed")?
}
