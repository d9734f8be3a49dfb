//! Facial expression vocabulary and the per-frame mood derived from it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Expression labels reported by the detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    /// Iteration order used when picking the dominant expression. On equal
    /// scores the label listed first wins.
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];
}

/// Score per expression label for one face.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExpressionScores(HashMap<Expression, f32>);

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, expression: Expression, score: f32) -> Self {
        self.0.insert(expression, score);
        self
    }

    pub fn get(&self, expression: Expression) -> Option<f32> {
        self.0.get(&expression).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label with the strictly highest score, walking `Expression::ALL` so
    /// ties resolve to the earliest label. NaN scores never win.
    pub fn dominant(&self) -> Option<Expression> {
        let mut best: Option<(Expression, f32)> = None;
        for expression in Expression::ALL {
            let Some(score) = self.get(expression) else {
                continue;
            };
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((expression, score)),
            }
        }
        best.map(|(expression, _)| expression)
    }
}

impl FromIterator<(Expression, f32)> for ExpressionScores {
    fn from_iter<I: IntoIterator<Item = (Expression, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Mood shown for a frame or recorded with an observation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mood {
    #[default]
    Unknown,
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Unknown => "UNKNOWN",
            Mood::Neutral => "NEUTRAL",
            Mood::Happy => "HAPPY",
            Mood::Sad => "SAD",
            Mood::Angry => "ANGRY",
            Mood::Fearful => "FEARFUL",
            Mood::Disgusted => "DISGUSTED",
            Mood::Surprised => "SURPRISED",
        }
    }
}

impl From<Expression> for Mood {
    fn from(expression: Expression) -> Self {
        match expression {
            Expression::Neutral => Mood::Neutral,
            Expression::Happy => Mood::Happy,
            Expression::Sad => Mood::Sad,
            Expression::Angry => Mood::Angry,
            Expression::Fearful => Mood::Fearful,
            Expression::Disgusted => Mood::Disgusted,
            Expression::Surprised => Mood::Surprised,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn picks_strict_maximum() {
        let scores = ExpressionScores::new()
            .with(Expression::Happy, 0.9)
            .with(Expression::Neutral, 0.1);
        assert_eq!(scores.dominant(), Some(Expression::Happy));
    }

    #[test]
    fn empty_scores_have_no_dominant_label() {
        assert_eq!(ExpressionScores::new().dominant(), None);
    }

    #[test]
    fn nan_scores_are_ignored() {
        let scores = ExpressionScores::new()
            .with(Expression::Neutral, f32::NAN)
            .with(Expression::Sad, 0.2);
        assert_eq!(scores.dominant(), Some(Expression::Sad));
    }

    #[rstest]
    #[case::happy_sad(vec![Expression::Happy, Expression::Sad], Expression::Happy)]
    #[case::sad_happy(vec![Expression::Sad, Expression::Happy], Expression::Happy)]
    #[case::surprised_neutral(vec![Expression::Surprised, Expression::Neutral], Expression::Neutral)]
    #[case::three_way(
        vec![Expression::Disgusted, Expression::Angry, Expression::Fearful],
        Expression::Angry
    )]
    #[case::three_way_reversed(
        vec![Expression::Fearful, Expression::Angry, Expression::Disgusted],
        Expression::Angry
    )]
    fn ties_resolve_to_earliest_label(#[case] tied: Vec<Expression>, #[case] expected: Expression) {
        let scores: ExpressionScores = tied.iter().map(|expression| (*expression, 0.4)).collect();
        assert_eq!(scores.dominant(), Some(expected));
    }

    #[test]
    fn tie_break_holds_for_every_insertion_order() {
        let labels = Expression::ALL;
        // Rotate the insertion order through every starting label; the
        // winner must stay the first label in the fixed order.
        for start in 0..labels.len() {
            let scores: ExpressionScores = labels
                .iter()
                .cycle()
                .skip(start)
                .take(labels.len())
                .map(|expression| (*expression, 0.5))
                .collect();
            assert_eq!(scores.dominant(), Some(Expression::Neutral));
        }
    }

    #[test]
    fn scores_deserialize_from_lowercase_labels() {
        let scores: ExpressionScores =
            serde_json::from_str(r#"{"happy": 0.7, "surprised": 0.3}"#).unwrap();
        assert_eq!(scores.get(Expression::Happy), Some(0.7));
        assert_eq!(scores.dominant(), Some(Expression::Happy));
    }

    #[test]
    fn mood_displays_uppercase() {
        assert_eq!(Mood::from(Expression::Happy).to_string(), "HAPPY");
        assert_eq!(Mood::default().to_string(), "UNKNOWN");
        assert_eq!(serde_json::to_string(&Mood::Sad).unwrap(), "\"SAD\"");
    }
}
