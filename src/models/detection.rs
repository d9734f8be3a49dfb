use std::fmt;

use serde::{Deserialize, Serialize};

use super::expression::ExpressionScores;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in frame pixel space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One face as reported by the detector for a single frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
    pub age: f32,
    pub gender: Gender,
    #[serde(default)]
    pub expressions: ExpressionScores,
}

impl FaceDetection {
    pub fn new(gender: Gender, age: f32, expressions: ExpressionScores) -> Self {
        Self {
            bounds: BoundingBox::default(),
            age,
            gender,
            expressions,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// Detector ages are fractional estimates; observations keep whole years.
    pub fn rounded_age(&self) -> u32 {
        if self.age.is_finite() && self.age > 0.0 {
            self.age.round() as u32
        } else {
            0
        }
    }
}
