use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use tandem_core::models::AlignmentRecord;
use tandem_core::{Result, TandemError};

use crate::dists::observer::CorrectnessObserver;
use crate::dists::stratified::{SamplingParams, StratifiedReservoir};
use crate::template::PairTemplate;

///
/// What happened to a pair offered to a [`ScorePairDistribution`].
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairAddOutcome {
    Added,
    /// Fragment longer than the configured maximum
    FragmentTooLong(usize),
    /// Mates aligned to different reference sequences
    DifferentReferences,
}

///
/// Score-stratified sample of paired alignment templates, keyed by the sum
/// of both mates' scores. Also tracks fragment-length statistics.
///
#[derive(Debug, Serialize, Deserialize)]
pub struct ScorePairDistribution {
    name: String,
    samples: StratifiedReservoir<PairTemplate>,
    max_allowed_fraglen: usize,
    num_added: u64,
    num_skipped: u64,
    total_fragment_length: u64,
    max_fragment_length: usize,
    average_length: Option<f64>,
    #[serde(skip)]
    mate1_observer: Option<Box<dyn CorrectnessObserver>>,
    #[serde(skip)]
    mate2_observer: Option<Box<dyn CorrectnessObserver>>,
}

impl ScorePairDistribution {
    pub fn new(name: &str, params: SamplingParams, max_allowed_fraglen: usize) -> Self {
        Self {
            name: name.to_string(),
            samples: StratifiedReservoir::new(params),
            max_allowed_fraglen,
            num_added: 0,
            num_skipped: 0,
            total_fragment_length: 0,
            max_fragment_length: 0,
            average_length: None,
            mate1_observer: None,
            mate2_observer: None,
        }
    }

    pub fn with_observers(
        mut self,
        mate1: Box<dyn CorrectnessObserver>,
        mate2: Box<dyn CorrectnessObserver>,
    ) -> Self {
        self.set_observers(mate1, mate2);
        self
    }

    pub fn set_observers(
        &mut self,
        mate1: Box<dyn CorrectnessObserver>,
        mate2: Box<dyn CorrectnessObserver>,
    ) {
        self.mate1_observer = Some(mate1);
        self.mate2_observer = Some(mate2);
    }

    ///
    /// Parse both mates into a pair template and sample it. Pairs on
    /// different references or with an overlong fragment are counted and
    /// skipped rather than treated as errors.
    ///
    pub fn add<R: Rng>(
        &mut self,
        a: &AlignmentRecord,
        b: &AlignmentRecord,
        rng: &mut R,
    ) -> Result<PairAddOutcome> {
        if self.samples.is_finalized() {
            return Err(TandemError::AlreadyFinalized);
        }
        let Some(pair) = PairTemplate::from_records(a, b)? else {
            return Ok(self.record_different_references());
        };
        let (mate1, mate2) = if !a.is_mate1 && b.is_mate1 { (b, a) } else { (a, b) };
        self.add_pair(pair, (mate1.correct, mate2.correct), rng)
    }

    ///
    /// Sample an already-parsed pair. `correct` holds the aligner's
    /// correctness labels for mate 1 and mate 2, if known.
    ///
    pub fn add_pair<R: Rng>(
        &mut self,
        pair: PairTemplate,
        correct: (Option<bool>, Option<bool>),
        rng: &mut R,
    ) -> Result<PairAddOutcome> {
        let fraglen = pair.fragment_length;
        if fraglen > self.max_allowed_fraglen {
            self.num_skipped += 1;
            return Ok(PairAddOutcome::FragmentTooLong(fraglen));
        }

        let score = pair.score();
        self.samples.add(score, pair, rng)?;
        self.num_added += 1;
        self.total_fragment_length += fraglen as u64;
        self.max_fragment_length = self.max_fragment_length.max(fraglen);

        if let (Some(observer), Some(correct)) = (self.mate1_observer.as_mut(), correct.0) {
            observer.on_add(score, correct);
        }
        if let (Some(observer), Some(correct)) = (self.mate2_observer.as_mut(), correct.1) {
            observer.on_add(score, correct);
        }
        Ok(PairAddOutcome::Added)
    }

    /// Count a pair whose mates aligned to different references
    pub fn record_different_references(&mut self) -> PairAddOutcome {
        self.num_skipped += 1;
        PairAddOutcome::DifferentReferences
    }

    pub fn finalize(&mut self) {
        self.samples.finalize();
        if self.num_added > 0 {
            self.average_length =
                Some(self.total_fragment_length as f64 / self.num_added as f64);
        }
        debug!(
            "Finalized {} distribution: {} added, {} skipped, max fragment {}",
            self.name, self.num_added, self.num_skipped, self.max_fragment_length
        );
    }

    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Result<&PairTemplate> {
        if self.num_added == 0 {
            return Err(TandemError::EmptyDistribution(self.name.clone()));
        }
        let pair = self.samples.draw(rng)?;
        let score = pair.score();
        if let Some(observer) = self.mate1_observer.as_mut() {
            observer.on_draw(score);
        }
        if let Some(observer) = self.mate2_observer.as_mut() {
            observer.on_draw(score);
        }
        Ok(pair)
    }

    pub fn is_empty(&self) -> bool {
        self.num_added == 0
    }

    pub fn is_finalized(&self) -> bool {
        self.samples.is_finalized()
    }

    pub fn num_added(&self) -> u64 {
        self.num_added
    }

    pub fn max_allowed_fraglen(&self) -> usize {
        self.max_allowed_fraglen
    }

    pub fn num_skipped(&self) -> u64 {
        self.num_skipped
    }

    /// Longest fragment among added pairs
    pub fn max_observed_length(&self) -> usize {
        self.max_fragment_length
    }

    /// Mean fragment length, available once finalized and non-empty
    pub fn average_length(&self) -> Option<f64> {
        self.average_length
    }

    /// Longest observed length and mean length together
    pub fn length_stats(&self) -> (usize, Option<f64>) {
        (self.max_observed_length(), self.average_length)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
