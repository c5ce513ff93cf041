use std::sync::Mutex;

use rand::Rng;

use tandem_core::Result;
use tandem_core::models::AlignmentRecord;

use crate::dists::pair::{PairAddOutcome, ScorePairDistribution};
use crate::dists::score::ScoreDistribution;

///
/// A distribution that several producer threads may add to at once. Every
/// add takes the one lock guarding the distribution, so reservoir updates
/// are serialized; each thread brings its own random source.
///
#[derive(Debug)]
pub struct SharedDistribution<D> {
    inner: Mutex<D>,
}

impl<D> SharedDistribution<D> {
    pub fn new(dist: D) -> Self {
        Self {
            inner: Mutex::new(dist),
        }
    }

    /// Run `f` with exclusive access to the distribution
    pub fn with<T>(&self, f: impl FnOnce(&mut D) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn into_inner(self) -> D {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl SharedDistribution<ScoreDistribution> {
    pub fn add<R: Rng>(&self, rec: &AlignmentRecord, rng: &mut R) -> Result<()> {
        self.with(|dist| dist.add(rec, rng))
    }
}

impl SharedDistribution<ScorePairDistribution> {
    pub fn add<R: Rng>(
        &self,
        a: &AlignmentRecord,
        b: &AlignmentRecord,
        rng: &mut R,
    ) -> Result<PairAddOutcome> {
        self.with(|dist| dist.add(a, b, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dists::stratified::SamplingParams;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rayon::prelude::*;
    use rstest::*;
    use tandem_core::models::Strand;

    fn params() -> SamplingParams {
        SamplingParams {
            capacity: 50,
            per_score_capacity: 5,
            fraction_even: 0.5,
            low_score_bias: 1.0,
        }
    }

    #[rstest]
    fn test_concurrent_unpaired_adds() {
        let shared = SharedDistribution::new(ScoreDistribution::new("unp", params()));

        (0..8u64).into_par_iter().for_each(|worker| {
            let mut rng = StdRng::seed_from_u64(worker);
            for i in 0..250i64 {
                let rec = AlignmentRecord::new("chr1", 0, Strand::Forward, -(i % 7), "4M", "4", "ACGT", "IIII");
                shared.add(&rec, &mut rng).unwrap();
            }
        });

        let mut dist = shared.into_inner();
        assert_eq!(dist.num_added(), 2000);
        dist.finalize();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(dist.draw(&mut rng).unwrap().score <= 0);
    }

    #[rstest]
    fn test_concurrent_pair_adds() {
        let shared = SharedDistribution::new(ScorePairDistribution::new("conc", params(), 10_000));

        (0..4u64).into_par_iter().for_each(|worker| {
            let mut rng = StdRng::seed_from_u64(worker);
            for i in 0..100u64 {
                let m1 = AlignmentRecord::new("chr1", i, Strand::Forward, 0, "4M", "4", "ACGT", "IIII");
                let m2 = AlignmentRecord::new("chr1", i + 100, Strand::Reverse, 0, "4M", "4", "ACGT", "IIII")
                    .with_mate1(false);
                shared.add(&m1, &m2, &mut rng).unwrap();
            }
        });

        let dist = shared.into_inner();
        assert_eq!(dist.num_added(), 400);
        assert_eq!(dist.max_observed_length(), 104);
    }
}
