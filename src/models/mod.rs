pub mod detection;
pub mod expression;
pub mod frame;
pub mod observation;

pub use detection::{BoundingBox, FaceDetection, Gender};
pub use expression::{Expression, ExpressionScores, Mood};
pub use frame::Frame;
pub use observation::Observation;
