use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use regex::bytes::Regex;

use tandem_core::models::Strand;
use tandem_core::utils::reverse_complement;
use tandem_core::{Result, TandemError};

use crate::reference::ReferenceProvider;

///
/// A stretch of reference drawn for a synthetic read or fragment.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledSubstring {
    pub ref_name: String,
    /// 0-based leftmost position on the forward strand
    pub offset: usize,
    pub strand: Strand,
    /// Upper-cased bases, reverse-complemented when `strand` is reverse
    pub seq: Vec<u8>,
}

/// Samples ACGT-only reference substrings
///
/// A reference sequence is chosen with probability proportional to its
/// length, then a start offset uniformly among those that fit. Windows
/// containing anything other than A, C, G or T are rejected and redrawn, up
/// to `max_attempts` tries. Accepted windows are reverse-complemented half
/// the time.
#[derive(Debug)]
pub struct SequenceSimulator<P: ReferenceProvider> {
    reference: P,
    lengths: Vec<usize>,
    longest: usize,
    selector: WeightedIndex<u64>,
    non_acgt: Regex,
    max_attempts: usize,
}

impl<P: ReferenceProvider> SequenceSimulator<P> {
    pub fn new(reference: P, max_attempts: usize) -> Result<Self> {
        let lengths = reference
            .names()
            .iter()
            .map(|name| reference.sequence_length(name))
            .collect::<Result<Vec<usize>>>()?;
        let selector = WeightedIndex::new(lengths.iter().map(|&l| l as u64)).map_err(|e| {
            TandemError::EmptyDistribution(format!("reference sequences ({})", e))
        })?;
        let non_acgt =
            Regex::new("[^ACGTacgt]").map_err(|e| TandemError::InvalidConfig(e.to_string()))?;
        let longest = lengths.iter().copied().max().unwrap_or(0);

        Ok(Self {
            reference,
            lengths,
            longest,
            selector,
            non_acgt,
            max_attempts,
        })
    }

    pub fn sample<R: Rng>(&self, length: usize, rng: &mut R) -> Result<SampledSubstring> {
        if length == 0 {
            return Err(TandemError::LengthMismatch(
                "cannot sample an empty substring".to_string(),
            ));
        }
        if length > self.longest {
            return Err(TandemError::NoValidSubstring {
                length,
                attempts: 0,
            });
        }

        for _ in 0..self.max_attempts {
            let idx = self.selector.sample(rng);
            let ref_len = self.lengths[idx];
            if ref_len < length {
                continue;
            }
            let name = &self.reference.names()[idx];
            let offset = rng.random_range(0..=ref_len - length);
            let window = self.reference.get(name, offset, length)?;
            if self.non_acgt.is_match(window) {
                continue;
            }

            let upper = window.to_ascii_uppercase();
            let (strand, seq) = if rng.random_bool(0.5) {
                (Strand::Reverse, reverse_complement(&upper))
            } else {
                (Strand::Forward, upper)
            };
            return Ok(SampledSubstring {
                ref_name: name.clone(),
                offset,
                strand,
                seq,
            });
        }

        Err(TandemError::NoValidSubstring {
            length,
            attempts: self.max_attempts,
        })
    }

    pub fn reference(&self) -> &P {
        &self.reference
    }
}
