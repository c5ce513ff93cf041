use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use serde::Serialize;

///
/// Diagnostic hook a distribution notifies as alignments are added and
/// templates drawn. Nothing in the sampling path depends on it.
///
pub trait CorrectnessObserver: Debug + Send {
    /// An alignment with `score` was added, with a known correctness label
    fn on_add(&mut self, score: i64, correct: bool);

    /// A template with `score` was drawn
    fn on_draw(&mut self, score: i64);
}

///
/// Per-score tally of how often the aligner was correct, plus the expected
/// fraction correct over everything drawn so far.
///
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreCorrectnessTally {
    /// score -> (correct, total)
    per_score: BTreeMap<i64, (u64, u64)>,
    num_drawn: u64,
    correct_mass: f64,
}

impl ScoreCorrectnessTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fraction_correct(&self, score: i64) -> Option<f64> {
        self.per_score
            .get(&score)
            .filter(|(_, total)| *total > 0)
            .map(|(correct, total)| *correct as f64 / *total as f64)
    }

    ///
    /// Average of the per-score fraction correct over all draws, i.e. the
    /// share of simulated reads expected to align correctly if the aligner
    /// behaves on them as it did on the input.
    ///
    pub fn expected_fraction_correct(&self) -> Option<f64> {
        if self.num_drawn == 0 {
            None
        } else {
            Some(self.correct_mass / self.num_drawn as f64)
        }
    }

    pub fn num_drawn(&self) -> u64 {
        self.num_drawn
    }

    pub fn scores(&self) -> impl Iterator<Item = (i64, u64, u64)> + '_ {
        self.per_score
            .iter()
            .map(|(&score, &(correct, total))| (score, correct, total))
    }
}

impl CorrectnessObserver for ScoreCorrectnessTally {
    fn on_add(&mut self, score: i64, correct: bool) {
        let entry = self.per_score.entry(score).or_insert((0, 0));
        if correct {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    fn on_draw(&mut self, score: i64) {
        self.num_drawn += 1;
        if let Some(p) = self.fraction_correct(score) {
            self.correct_mass += p;
        }
    }
}

// Lets a caller keep a handle on an observer it has handed to a distribution.
impl<O: CorrectnessObserver> CorrectnessObserver for Arc<Mutex<O>> {
    fn on_add(&mut self, score: i64, correct: bool) {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .on_add(score, correct);
    }

    fn on_draw(&mut self, score: i64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).on_draw(score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_tally() {
        let mut tally = ScoreCorrectnessTally::new();
        tally.on_add(0, true);
        tally.on_add(0, true);
        tally.on_add(-10, true);
        tally.on_add(-10, false);

        assert_eq!(tally.fraction_correct(0), Some(1.0));
        assert_eq!(tally.fraction_correct(-10), Some(0.5));
        assert_eq!(tally.fraction_correct(-3), None);
        assert_eq!(tally.expected_fraction_correct(), None);

        tally.on_draw(0);
        tally.on_draw(-10);
        tally.on_draw(-3);
        assert_eq!(tally.num_drawn(), 3);
        assert_eq!(tally.expected_fraction_correct(), Some(0.5));
    }

    #[rstest]
    fn test_shared_handle() {
        let shared = Arc::new(Mutex::new(ScoreCorrectnessTally::new()));
        let mut handle: Box<dyn CorrectnessObserver> = Box::new(Arc::clone(&shared));
        handle.on_add(-4, false);
        handle.on_draw(-4);
        let tally = shared.lock().unwrap();
        assert_eq!(tally.fraction_correct(-4), Some(0.0));
        assert_eq!(tally.scores().collect::<Vec<_>>(), vec![(-4, 0, 1)]);
    }
}
