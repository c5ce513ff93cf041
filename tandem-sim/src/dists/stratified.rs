use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use tandem_core::{Result, TandemError};

use crate::sampling::ReservoirSampler;

///
/// Capacities and draw-bias knobs shared by every score distribution.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Capacity of the overall reservoir
    pub capacity: usize,
    /// Capacity of each per-score reservoir
    pub per_score_capacity: usize,
    /// Probability a draw comes from the overall reservoir
    pub fraction_even: f64,
    /// Above 1.0, per-score draws favour the lowest observed scores
    pub low_score_bias: f64,
}

impl SamplingParams {
    pub fn is_stratified(&self) -> bool {
        self.fraction_even < 1.0
    }
}

/// Two-level reservoir keyed by alignment score
///
/// Every item goes into one overall reservoir. When stratification is on
/// (`fraction_even < 1`), it also goes into a small reservoir for its score.
/// A draw then comes from the overall reservoir with probability
/// `fraction_even`; otherwise a score is picked (uniformly over distinct
/// scores, or skewed toward low scores when `low_score_bias > 1`) and an item
/// is drawn from that score's reservoir. Rare low scores are therefore drawn
/// more often than their share of the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratifiedReservoir<T> {
    params: SamplingParams,
    overall: ReservoirSampler<T>,
    by_score: BTreeMap<i64, ReservoirSampler<T>>,
    sorted_scores: Vec<i64>,
    finalized: bool,
}

impl<T: Clone> StratifiedReservoir<T> {
    pub fn new(params: SamplingParams) -> Self {
        Self {
            params,
            overall: ReservoirSampler::new(params.capacity),
            by_score: BTreeMap::new(),
            sorted_scores: Vec::new(),
            finalized: false,
        }
    }

    pub fn add<R: Rng>(&mut self, score: i64, item: T, rng: &mut R) -> Result<()> {
        if self.finalized {
            return Err(TandemError::AlreadyFinalized);
        }
        if self.params.is_stratified() {
            let capacity = self.params.per_score_capacity;
            self.by_score
                .entry(score)
                .or_insert_with(|| ReservoirSampler::new(capacity))
                .add(item.clone(), rng);
        }
        self.overall.add(item, rng);
        Ok(())
    }

    pub fn finalize(&mut self) {
        self.sorted_scores = self.by_score.keys().copied().collect();
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn items_seen(&self) -> u64 {
        self.overall.items_seen()
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> Result<&T> {
        if !self.finalized {
            return Err(TandemError::NotFinalized);
        }
        if self.params.is_stratified()
            && !self.sorted_scores.is_empty()
            && rng.random::<f64>() > self.params.fraction_even
        {
            let score = self.pick_score(rng)?;
            return self
                .by_score
                .get(&score)
                .ok_or(TandemError::EmptyReservoir)?
                .draw(rng);
        }
        self.overall.draw(rng)
    }

    fn pick_score<R: Rng>(&self, rng: &mut R) -> Result<i64> {
        if self.params.low_score_bias > 1.0 {
            let u: f64 = rng.random();
            let divisor: f64 = rng.random_range(1.0..self.params.low_score_bias);
            let idx = ((u / divisor) * self.sorted_scores.len() as f64) as usize;
            Ok(self.sorted_scores[idx.min(self.sorted_scores.len() - 1)])
        } else {
            self.sorted_scores
                .choose(rng)
                .copied()
                .ok_or(TandemError::EmptyReservoir)
        }
    }

    /// Distinct scores seen, lowest first (empty unless stratified)
    pub fn scores(&self) -> &[i64] {
        &self.sorted_scores
    }

    pub fn params(&self) -> &SamplingParams {
        &self.params
    }
}
