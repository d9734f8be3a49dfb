//! Frame acquisition and the detection loop.
//!
//! Camera access and the face model live outside this crate; they plug in
//! through `FrameSource`, `Detector` and `CaptureBackend`.

pub mod controller;
pub mod loop_worker;
pub mod replay;

use std::time::Duration;

use anyhow::Result;

use crate::models::{FaceDetection, Frame};
use crate::settings::Settings;

pub use controller::CaptureController;
pub use replay::ReplayBackend;

/// Supplies the current video frame. Dropping the source releases the device.
pub trait FrameSource: Send + 'static {
    /// `Ok(None)` means no frame is ready yet.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// True once the source will never produce another frame. Live cameras
    /// never run dry.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Face model. Calls may block for as long as inference takes.
pub trait Detector: Send + 'static {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>>;
}

/// Acquires a frame source and loads a detector for each new session.
pub trait CaptureBackend: Send + Sync + 'static {
    fn open_source(&self) -> Result<Box<dyn FrameSource>>;
    fn load_detector(&self) -> Result<Box<dyn Detector>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Display refresh period; a cycle never starts more often than this.
    pub refresh_interval: Duration,
    /// Detections running longer than this are logged, never abandoned.
    pub slow_detection_warning: Duration,
    /// Log every processed frame.
    pub verbose: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl LoopSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        let debug_mode = std::env::var("CROWDMETER_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            refresh_interval: Duration::from_millis(settings.refresh_interval_ms.max(1)),
            slow_detection_warning: Duration::from_millis(settings.slow_detection_warn_ms.max(1)),
            verbose: debug_mode || settings.verbose_frames,
        }
    }
}
