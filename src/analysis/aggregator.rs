use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FaceDetection, Gender, Mood, Observation};

/// Per-frame snapshot of counts and mood. Replaced every cycle, never summed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameAggregate {
    pub male_count: u32,
    pub female_count: u32,
    pub mood: Mood,
    pub any_detected: bool,
}

impl FrameAggregate {
    pub fn total(&self) -> u32 {
        self.male_count + self.female_count
    }
}

/// Change in "someone is in view" between the previous frame and this one.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DetectionEdge {
    Unchanged,
    Appeared,
    Cleared,
}

#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub aggregate: FrameAggregate,
    /// One entry per detection, in detector order.
    pub observations: Vec<Observation>,
    pub edge: DetectionEdge,
}

/// Turns one frame's detections into a `FrameAggregate` plus observations.
///
/// The only state carried between frames is whether the previous frame had
/// anyone in it, which drives the appeared/cleared edge.
#[derive(Debug, Default)]
pub struct Aggregator {
    person_present: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, detections: &[FaceDetection], timestamp: DateTime<Utc>) -> FrameOutcome {
        let mut aggregate = FrameAggregate::default();
        let mut mood = Mood::Unknown;
        let mut observations = Vec::with_capacity(detections.len());

        for detection in detections {
            // A face without scores keeps the mood of the face before it.
            if let Some(expression) = detection.expressions.dominant() {
                mood = Mood::from(expression);
            }

            match detection.gender {
                Gender::Male => aggregate.male_count += 1,
                Gender::Female => aggregate.female_count += 1,
            }

            observations.push(Observation {
                age: detection.rounded_age(),
                gender: detection.gender,
                mood,
                timestamp,
            });
        }

        let detected = !detections.is_empty();
        let edge = match (self.person_present, detected) {
            (false, true) => DetectionEdge::Appeared,
            (true, false) => DetectionEdge::Cleared,
            _ => DetectionEdge::Unchanged,
        };
        self.person_present = detected;

        aggregate.mood = mood;
        aggregate.any_detected = detected;

        FrameOutcome {
            aggregate,
            observations,
            edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expression, ExpressionScores};
    use rstest::rstest;

    fn face(gender: Gender, age: f32, scores: &[(Expression, f32)]) -> FaceDetection {
        FaceDetection::new(gender, age, scores.iter().copied().collect())
    }

    fn faces(male: usize, female: usize) -> Vec<FaceDetection> {
        let neutral = [(Expression::Neutral, 1.0)];
        (0..male)
            .map(|_| face(Gender::Male, 40.0, &neutral))
            .chain((0..female).map(|_| face(Gender::Female, 35.0, &neutral)))
            .collect()
    }

    #[rstest]
    #[case::empty(0, 0)]
    #[case::single_male(1, 0)]
    #[case::single_female(0, 1)]
    #[case::mixed(3, 2)]
    #[case::crowd(7, 11)]
    fn counts_cover_every_detection(#[case] male: usize, #[case] female: usize) {
        let mut aggregator = Aggregator::new();
        let detections = faces(male, female);
        let outcome = aggregator.process(&detections, Utc::now());

        assert_eq!(outcome.aggregate.male_count as usize, male);
        assert_eq!(outcome.aggregate.female_count as usize, female);
        assert_eq!(outcome.aggregate.total() as usize, detections.len());
        assert_eq!(outcome.observations.len(), detections.len());
    }

    #[test]
    fn counts_do_not_carry_over_between_frames() {
        let mut aggregator = Aggregator::new();
        aggregator.process(&faces(3, 2), Utc::now());
        let second = aggregator.process(&faces(1, 0), Utc::now());

        assert_eq!(second.aggregate.male_count, 1);
        assert_eq!(second.aggregate.female_count, 0);
    }

    #[test]
    fn detection_edge_follows_presence() {
        let mut aggregator = Aggregator::new();
        let happy = [face(Gender::Male, 30.0, &[(Expression::Happy, 0.9)])];

        let empty = aggregator.process(&[], Utc::now());
        assert!(!empty.aggregate.any_detected);
        assert_eq!(empty.edge, DetectionEdge::Unchanged);

        let seen = aggregator.process(&happy, Utc::now());
        assert!(seen.aggregate.any_detected);
        assert_eq!(seen.edge, DetectionEdge::Appeared);
        assert_eq!(seen.aggregate.mood, Mood::Happy);

        let still = aggregator.process(&happy, Utc::now());
        assert_eq!(still.edge, DetectionEdge::Unchanged);

        let gone = aggregator.process(&[], Utc::now());
        assert!(!gone.aggregate.any_detected);
        assert_eq!(gone.edge, DetectionEdge::Cleared);
        assert_eq!(gone.aggregate.mood, Mood::Unknown);
    }

    #[test]
    fn frame_mood_is_last_face_and_observations_keep_their_own() {
        let mut aggregator = Aggregator::new();
        let detections = [
            face(Gender::Female, 22.0, &[(Expression::Sad, 0.6), (Expression::Happy, 0.4)]),
            face(Gender::Male, 51.0, &[(Expression::Surprised, 0.8)]),
        ];
        let outcome = aggregator.process(&detections, Utc::now());

        assert_eq!(outcome.aggregate.mood, Mood::Surprised);
        assert_eq!(outcome.observations[0].mood, Mood::Sad);
        assert_eq!(outcome.observations[1].mood, Mood::Surprised);
    }

    #[test]
    fn face_without_scores_inherits_running_mood() {
        let mut aggregator = Aggregator::new();
        let detections = [
            face(Gender::Male, 30.0, &[(Expression::Angry, 0.7)]),
            FaceDetection::new(Gender::Female, 30.0, ExpressionScores::new()),
        ];
        let outcome = aggregator.process(&detections, Utc::now());

        assert_eq!(outcome.observations[1].mood, Mood::Angry);
        assert_eq!(outcome.aggregate.mood, Mood::Angry);
    }

    #[test]
    fn observations_carry_rounded_age_and_timestamp() {
        let mut aggregator = Aggregator::new();
        let at = Utc::now();
        let outcome = aggregator.process(&[face(Gender::Female, 27.4, &[])], at);

        let observation = &outcome.observations[0];
        assert_eq!(observation.age, 27);
        assert_eq!(observation.gender, Gender::Female);
        assert_eq!(observation.mood, Mood::Unknown);
        assert_eq!(observation.timestamp, at);
    }
}
