use serde::{Deserialize, Serialize};

use crate::models::{FaceDetection, Frame, Observation};

/// Display surface and info panel geometry used to lay out the overlay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayGeometry {
    pub display_width: u32,
    pub display_height: u32,
    pub panel_width: f32,
    pub panel_height: f32,
    /// Horizontal gap between a face box and its info panel.
    pub panel_gap: f32,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            display_width: 640,
            display_height: 480,
            panel_width: 250.0,
            panel_height: 100.0,
            panel_gap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Display-space box and info panel for one face.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayItem {
    pub face: Rect,
    pub panel: Rect,
    pub lines: Vec<String>,
}

/// Lay out one overlay item per detection. `observations` must be the
/// aggregator output for the same detections, in the same order.
pub fn layout(
    frame: &Frame,
    detections: &[FaceDetection],
    observations: &[Observation],
    geometry: &OverlayGeometry,
) -> Vec<OverlayItem> {
    let scale_x = scale(geometry.display_width, frame.width());
    let scale_y = scale(geometry.display_height, frame.height());

    detections
        .iter()
        .zip(observations)
        .map(|(detection, observation)| {
            let bounds = detection.bounds;
            let face = Rect {
                x: bounds.x * scale_x,
                y: bounds.y * scale_y,
                width: bounds.width * scale_x,
                height: bounds.height * scale_y,
            };
            let panel = Rect {
                x: face.x + face.width + geometry.panel_gap,
                y: face.y,
                width: geometry.panel_width,
                height: geometry.panel_height,
            };
            OverlayItem {
                face,
                panel,
                lines: vec![
                    format!("AGE: {}", observation.age),
                    format!("GENDER: {}", observation.gender),
                    format!("EMOTION: {}", observation.mood),
                ],
            }
        })
        .collect()
}

fn scale(display: u32, frame: u32) -> f32 {
    if frame == 0 {
        1.0
    } else {
        display as f32 / frame as f32
    }
}
