use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;

/// A captured video frame. Pixel data is shared so handing a frame to the
/// detector worker does not copy it.
#[derive(Clone, Debug)]
pub struct Frame {
    index: u64,
    captured_at: DateTime<Utc>,
    image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(index: u64, captured_at: DateTime<Utc>, image: Arc<RgbImage>) -> Self {
        Self {
            index,
            captured_at,
            image,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// A stream that has not produced metadata yet yields zero-sized frames.
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}
