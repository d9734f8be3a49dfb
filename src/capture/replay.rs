//! Replays recorded detector output against a synthetic frame stream.
//!
//! A replay script is JSON lines: each non-empty line is the array of
//! detections for one frame (`[]` for a frame with nobody in view).

use std::{
    fs,
    path::Path,
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use image::RgbImage;

use crate::models::{FaceDetection, Frame};

use super::{CaptureBackend, Detector, FrameSource};

#[derive(Debug, Clone)]
pub struct ReplayBackend {
    script: Arc<Vec<Vec<FaceDetection>>>,
    frame_width: u32,
    frame_height: u32,
    latency: Duration,
}

impl ReplayBackend {
    pub fn new(script: Vec<Vec<FaceDetection>>) -> Self {
        Self {
            script: Arc::new(script),
            frame_width: 640,
            frame_height: 480,
            latency: Duration::ZERO,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let script = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str::<Vec<FaceDetection>>(line)
                    .with_context(|| format!("invalid detections on line {}", number + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(script))
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    /// Simulated inference time per frame.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.script.len()
    }
}

impl CaptureBackend for ReplayBackend {
    fn open_source(&self) -> Result<Box<dyn FrameSource>> {
        if self.frame_width == 0 || self.frame_height == 0 {
            bail!(
                "synthetic source cannot produce {}x{} frames",
                self.frame_width,
                self.frame_height
            );
        }
        Ok(Box::new(SyntheticSource {
            image: Arc::new(RgbImage::new(self.frame_width, self.frame_height)),
            next_index: 0,
            frame_count: self.script.len() as u64,
        }))
    }

    fn load_detector(&self) -> Result<Box<dyn Detector>> {
        Ok(Box::new(ReplayDetector {
            script: Arc::clone(&self.script),
            cursor: 0,
            latency: self.latency,
        }))
    }
}

/// Blank frames, one per scripted detection set; afterwards the source is
/// exhausted.
struct SyntheticSource {
    image: Arc<RgbImage>,
    next_index: u64,
    frame_count: u64,
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index >= self.frame_count {
            return Ok(None);
        }
        let frame = Frame::new(self.next_index, Utc::now(), Arc::clone(&self.image));
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn is_exhausted(&self) -> bool {
        self.next_index >= self.frame_count
    }
}

struct ReplayDetector {
    script: Arc<Vec<Vec<FaceDetection>>>,
    cursor: usize,
    latency: Duration,
}

impl Detector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceDetection>> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let detections = self.script.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    const SCRIPT: &str = r#"
[{"box": {"x": 1, "y": 2, "width": 3, "height": 4}, "age": 30, "gender": "male", "expressions": {"happy": 0.9, "neutral": 0.1}}]

[]
"#;

    #[test]
    fn parses_one_frame_per_non_empty_line() {
        let backend = ReplayBackend::parse(SCRIPT).unwrap();
        assert_eq!(backend.frame_count(), 2);
    }

    #[test]
    fn reports_the_offending_line() {
        let err = ReplayBackend::parse("[]\n{not json}\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn source_stops_after_scripted_frames() {
        let backend = ReplayBackend::parse(SCRIPT).unwrap().with_frame_size(32, 24);
        let mut source = backend.open_source().unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!((first.index(), first.width(), first.height()), (0, 32, 24));
        assert!(!source.is_exhausted());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.is_exhausted());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn detector_replays_script_in_order() {
        let backend = ReplayBackend::parse(SCRIPT).unwrap();
        let mut source = backend.open_source().unwrap();
        let mut detector = backend.load_detector().unwrap();
        let frame = source.next_frame().unwrap().unwrap();

        let first = detector.detect(&frame).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].gender, Gender::Male);
        assert!(detector.detect(&frame).unwrap().is_empty());
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn zero_sized_frames_fail_acquisition() {
        let backend = ReplayBackend::new(vec![]).with_frame_size(0, 480);
        assert!(backend.open_source().is_err());
    }
}
