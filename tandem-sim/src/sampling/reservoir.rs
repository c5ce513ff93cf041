use rand::Rng;
use serde::{Deserialize, Serialize};

use tandem_core::{Result, TandemError};

/// Reservoir sampler: a fixed-capacity uniform sample of a stream
///
/// Implements Algorithm R (Vitter, 1985). The first `k` items fill the
/// reservoir; the `n`-th item after that replaces a uniformly chosen slot with
/// probability `k / n`. After any number of adds the reservoir is a uniform
/// random sample, without replacement, of everything added so far.
///
/// # Algorithm Properties
/// - Time complexity: O(1) per add, O(1) per draw
/// - Space complexity: O(k)
/// - Streaming: true one-pass algorithm, stream length need not be known
///
/// The random source is passed to each call rather than owned, so a single
/// seeded generator can drive every sampler in a run and results depend only
/// on the seed and the order of calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservoirSampler<T> {
    k: usize,
    items: Vec<T>,
    items_seen: u64,
}

impl<T> ReservoirSampler<T> {
    /// Create a new reservoir sampler
    ///
    /// # Arguments
    /// * `k` - Number of items to retain
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k.min(1024)),
            items_seen: 0,
        }
    }

    /// Offer one item to the reservoir
    pub fn add<R: Rng>(&mut self, item: T, rng: &mut R) {
        self.items_seen += 1;
        if self.k == 0 {
            return;
        }

        if self.items.len() < self.k {
            self.items.push(item);
        } else {
            let j = rng.random_range(0..self.items_seen);
            if (j as usize) < self.k {
                self.items[j as usize] = item;
            }
        }
    }

    /// Uniform random pick from the current contents
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Result<&T> {
        if self.items.is_empty() {
            return Err(TandemError::EmptyReservoir);
        }
        let i = rng.random_range(0..self.items.len());
        Ok(&self.items[i])
    }

    /// Current occupancy, at most `capacity()`
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Number of items ever offered
    pub fn items_seen(&self) -> u64 {
        self.items_seen
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;
    use std::collections::HashSet;

    #[fixture]
    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[rstest]
    fn test_fills_then_holds_capacity(mut rng: StdRng) {
        let mut sampler = ReservoirSampler::new(10);
        for i in 0..5 {
            sampler.add(i, &mut rng);
        }
        assert_eq!(sampler.size(), 5);
        assert_eq!(sampler.items(), &[0, 1, 2, 3, 4]);

        for i in 5..1000 {
            sampler.add(i, &mut rng);
        }
        assert_eq!(sampler.size(), 10);
        assert_eq!(sampler.capacity(), 10);
        assert_eq!(sampler.items_seen(), 1000);
    }

    #[rstest]
    fn test_without_replacement(mut rng: StdRng) {
        let mut sampler = ReservoirSampler::new(50);
        for i in 0..10_000 {
            sampler.add(i, &mut rng);
        }
        let unique: HashSet<_> = sampler.items().iter().collect();
        assert_eq!(unique.len(), 50, "Duplicates found in sample");
    }

    #[rstest]
    fn test_empty_draw(mut rng: StdRng) {
        let sampler: ReservoirSampler<u32> = ReservoirSampler::new(10);
        assert!(matches!(sampler.draw(&mut rng), Err(TandemError::EmptyReservoir)));
    }

    #[rstest]
    fn test_zero_capacity(mut rng: StdRng) {
        let mut sampler = ReservoirSampler::new(0);
        sampler.add(1u8, &mut rng);
        assert!(sampler.is_empty());
        assert_eq!(sampler.items_seen(), 1);
        assert!(sampler.draw(&mut rng).is_err());
    }

    #[rstest]
    fn test_draw_returns_member(mut rng: StdRng) {
        let mut sampler = ReservoirSampler::new(3);
        for i in 0..3 {
            sampler.add(i * 10, &mut rng);
        }
        for _ in 0..100 {
            let x = *sampler.draw(&mut rng).unwrap();
            assert!([0, 10, 20].contains(&x));
        }
    }

    #[rstest]
    fn test_seeded_reproducibility() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sampler = ReservoirSampler::new(20);
            for i in 0..5000 {
                sampler.add(i, &mut rng);
            }
            sampler.items().to_vec()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }
}

// Include statistical tests
#[cfg(test)]
#[path = "reservoir_tests.rs"]
mod statistical_tests;
