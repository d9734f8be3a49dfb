use anyhow::{bail, Result};

use crate::models::Observation;

/// Append-only log of every observation in a session.
///
/// The log is unbounded. Once sealed (when the session summary is derived)
/// further appends are rejected.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    observations: Vec<Observation>,
    sealed: bool,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I>(&mut self, observations: I) -> Result<usize>
    where
        I: IntoIterator<Item = Observation>,
    {
        if self.sealed {
            bail!("observation log is sealed");
        }
        let before = self.observations.len();
        self.observations.extend(observations);
        Ok(self.observations.len() - before)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Mood};
    use chrono::Utc;

    fn observation(age: u32) -> Observation {
        Observation {
            age,
            gender: Gender::Male,
            mood: Mood::Neutral,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn appends_preserve_order() {
        let mut recorder = SessionRecorder::new();
        assert!(recorder.is_empty());

        assert_eq!(recorder.append([observation(20), observation(21)]).unwrap(), 2);
        assert_eq!(recorder.append([observation(22)]).unwrap(), 1);

        let ages: Vec<u32> = recorder.observations().iter().map(|o| o.age).collect();
        assert_eq!(ages, vec![20, 21, 22]);
    }

    #[test]
    fn sealed_log_rejects_appends() {
        let mut recorder = SessionRecorder::new();
        recorder.append([observation(30)]).unwrap();
        recorder.seal();

        assert!(recorder.append([observation(31)]).is_err());
        assert_eq!(recorder.len(), 1);
    }
}
