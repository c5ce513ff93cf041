use log::info;
use rand::Rng;
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;

use tandem_core::models::{AlignmentKind, Read, Strand};
use tandem_core::utils::reverse_complement;
use tandem_core::{Result, TandemError};

use crate::config::TandemConfig;
use crate::consts::{MISSING_QUALITY_FILL, PROGRESS_INTERVAL};
use crate::model::InputModel;
use crate::mutate::{MutatedRead, ReadMutator};
use crate::read_name::{MateOrigin, SyntheticName};
use crate::reference::ReferenceProvider;
use crate::sequence::SequenceSimulator;
use crate::template::ReadTemplate;

///
/// One simulated read, or both ends of a simulated pair (mate 1 first).
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedReads {
    Unpaired(Read),
    Paired(Read, Read),
}

impl SimulatedReads {
    pub fn mate1(&self) -> &Read {
        match self {
            SimulatedReads::Unpaired(rd) | SimulatedReads::Paired(rd, _) => rd,
        }
    }

    pub fn mate2(&self) -> Option<&Read> {
        match self {
            SimulatedReads::Unpaired(_) => None,
            SimulatedReads::Paired(_, rd) => Some(rd),
        }
    }
}

///
/// Reads (or pairs) of each alignment kind.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationCounts {
    pub unpaired: u64,
    pub bad_end: u64,
    pub concordant: u64,
    pub discordant: u64,
}

impl SimulationCounts {
    pub fn get(&self, kind: AlignmentKind) -> u64 {
        match kind {
            AlignmentKind::Unpaired => self.unpaired,
            AlignmentKind::BadEnd => self.bad_end,
            AlignmentKind::Concordant => self.concordant,
            AlignmentKind::Discordant => self.discordant,
        }
    }

    pub fn record(&mut self, kind: AlignmentKind) {
        match kind {
            AlignmentKind::Unpaired => self.unpaired += 1,
            AlignmentKind::BadEnd => self.bad_end += 1,
            AlignmentKind::Concordant => self.concordant += 1,
            AlignmentKind::Discordant => self.discordant += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.unpaired + self.bad_end + self.concordant + self.discordant
    }
}

///
/// How many reads of each kind a batch should produce.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub unpaired: usize,
    pub bad_end: usize,
    pub concordant: usize,
    pub discordant: usize,
}

impl BatchPlan {
    ///
    /// For each kind observed during training, `sim_fraction` of the number
    /// observed but no fewer than that kind's minimum. Kinds never observed
    /// get nothing.
    ///
    pub fn from_model(model: &InputModel, config: &TandemConfig) -> Self {
        let target = |kind: AlignmentKind, minimum: usize| {
            if model.has(kind) {
                ((config.sim_fraction * model.count(kind) as f64) as usize).max(minimum)
            } else {
                0
            }
        };
        Self {
            unpaired: target(AlignmentKind::Unpaired, config.sim_unp_min),
            bad_end: target(AlignmentKind::BadEnd, config.sim_bad_end_min),
            concordant: target(AlignmentKind::Concordant, config.sim_conc_min),
            discordant: target(AlignmentKind::Discordant, config.sim_disc_min),
        }
    }

    pub fn get(&self, kind: AlignmentKind) -> usize {
        match kind {
            AlignmentKind::Unpaired => self.unpaired,
            AlignmentKind::BadEnd => self.bad_end,
            AlignmentKind::Concordant => self.concordant,
            AlignmentKind::Discordant => self.discordant,
        }
    }

    pub fn total(&self) -> usize {
        self.unpaired + self.bad_end + self.concordant + self.discordant
    }
}

///
/// Generates synthetic reads that mimic the training alignments: each read
/// copies the edits, qualities and (for pairs) fragment length of a sampled
/// template, applied to fresh reference sequence, and carries its true
/// origin in its name.
///
#[derive(Debug)]
pub struct SimulatorWrapper<P: ReferenceProvider> {
    model: InputModel,
    sequences: SequenceSimulator<P>,
    mutator: ReadMutator,
    rng: StdRng,
    kind_selector: WeightedIndex<u64>,
    counts: SimulationCounts,
}

impl<P: ReferenceProvider> SimulatorWrapper<P> {
    pub fn new(model: InputModel, reference: P, config: &TandemConfig) -> Result<Self> {
        if !model.is_finalized() {
            return Err(TandemError::NotFinalized);
        }
        let kind_selector = WeightedIndex::new(AlignmentKind::ALL.iter().map(|&k| model.count(k)))
            .map_err(|_| TandemError::EmptyDistribution("input model".to_string()))?;
        let sequences = SequenceSimulator::new(reference, config.max_sample_attempts)?;

        Ok(Self {
            model,
            sequences,
            mutator: ReadMutator::new(config.perfect_score()),
            rng: StdRng::seed_from_u64(config.seed),
            kind_selector,
            counts: SimulationCounts::default(),
        })
    }

    ///
    /// Simulate one read or pair, choosing its kind in proportion to how
    /// often each kind was observed in training.
    ///
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(AlignmentKind, SimulatedReads)> {
        let kind = AlignmentKind::ALL[self.kind_selector.sample(&mut self.rng)];
        let reads = self.simulate(kind)?;
        Ok((kind, reads))
    }

    pub fn simulate(&mut self, kind: AlignmentKind) -> Result<SimulatedReads> {
        let reads = match kind {
            AlignmentKind::Unpaired => self.simulate_unpaired()?,
            AlignmentKind::BadEnd => self.simulate_bad_end()?,
            AlignmentKind::Concordant | AlignmentKind::Discordant => self.simulate_pair(kind)?,
        };
        self.counts.record(kind);
        Ok(reads)
    }

    ///
    /// Simulate every read in `plan`, handing each to `sink` as it is made.
    /// Returns how many of each kind this batch produced.
    ///
    pub fn simulate_batch<F>(&mut self, plan: &BatchPlan, mut sink: F) -> Result<SimulationCounts>
    where
        F: FnMut(AlignmentKind, SimulatedReads) -> Result<()>,
    {
        info!(
            "Simulating {} reads ({} conc, {} disc, {} bad-end, {} unp)",
            plan.total(),
            plan.concordant,
            plan.discordant,
            plan.bad_end,
            plan.unpaired
        );
        let mut batch = SimulationCounts::default();
        for kind in AlignmentKind::ALL {
            for _ in 0..plan.get(kind) {
                let reads = self.simulate(kind)?;
                sink(kind, reads)?;
                batch.record(kind);
                if batch.total() % PROGRESS_INTERVAL == 0 {
                    info!(
                        "  simulated {} reads ({} conc, {} disc, {} bad-end, {} unp)",
                        batch.total(),
                        batch.concordant,
                        batch.discordant,
                        batch.bad_end,
                        batch.unpaired
                    );
                }
            }
        }
        Ok(batch)
    }

    pub fn counts(&self) -> SimulationCounts {
        self.counts
    }

    pub fn model(&self) -> &InputModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut InputModel {
        &mut self.model
    }

    pub fn into_model(self) -> InputModel {
        self.model
    }

    fn simulate_unpaired(&mut self) -> Result<SimulatedReads> {
        let template = self.model.unpaired.draw(&mut self.rng)?.clone();
        let (read, origin) = self.simulate_end(&template)?;
        let name = SyntheticName::unpaired(origin).encode()?;
        Ok(SimulatedReads::Unpaired(Read::new(name, read.seq, read.qual)))
    }

    fn simulate_bad_end(&mut self) -> Result<SimulatedReads> {
        let template = self.model.bad_end.draw(&mut self.rng)?.clone();
        let (aligned, origin) = self.simulate_end(&template)?;

        let other_len = template
            .opposite_len
            .filter(|&len| len > 0)
            .unwrap_or_else(|| template.read_len());
        let other = MutatedRead {
            seq: random_bases(other_len, &mut self.rng),
            qual: fit_quality(&template.quality, other_len),
        };

        let (mate1, mate2, name) = if template.is_mate1 {
            let name = SyntheticName::paired(origin, MateOrigin::unplaced(), AlignmentKind::BadEnd);
            (aligned, other, name)
        } else {
            let name = SyntheticName::paired(MateOrigin::unplaced(), origin, AlignmentKind::BadEnd);
            (other, aligned, name)
        };
        let name = name.encode()?;
        Ok(SimulatedReads::Paired(
            Read::new(name.clone(), mate1.seq, mate1.qual),
            Read::new(name, mate2.seq, mate2.qual),
        ))
    }

    ///
    /// Sample one fragment of the template's length and cut both mates from
    /// its ends. The upstream template lands at the fragment's left end when
    /// the fragment is sampled from the forward strand; on the reverse
    /// strand the whole pair is mirrored, both mates flipping strand.
    ///
    fn simulate_pair(&mut self, kind: AlignmentKind) -> Result<SimulatedReads> {
        let dist = match kind {
            AlignmentKind::Discordant => &mut self.model.discordant,
            _ => &mut self.model.concordant,
        };
        let pair = dist.draw(&mut self.rng)?.clone();
        let fraglen = pair.fragment_length;
        let (up, down) = (pair.upstream(), pair.downstream());
        if up.reference_span() > fraglen || down.reference_span() > fraglen {
            return Err(TandemError::LengthMismatch(format!(
                "mates spanning {} and {} do not fit a {} base fragment",
                up.reference_span(),
                down.reference_span(),
                fraglen
            )));
        }

        let sub = self.sequences.sample(fraglen, &mut self.rng)?;
        let fragment = match sub.strand {
            Strand::Forward => sub.seq,
            Strand::Reverse => reverse_complement(&sub.seq),
        };
        let (up_start, up_strand, down_start, down_strand) = match sub.strand {
            Strand::Forward => (0, up.strand, fraglen - down.reference_span(), down.strand),
            Strand::Reverse => (
                fraglen - up.reference_span(),
                up.strand.flip(),
                0,
                down.strand.flip(),
            ),
        };

        let up_end = self.cut_mate(&fragment, up_start, up_strand, up)?;
        let down_end = self.cut_mate(&fragment, down_start, down_strand, down)?;
        let to_origin = |start: usize, strand: Strand, template: &ReadTemplate| {
            MateOrigin::new(&sub.ref_name, strand, (sub.offset + start) as u64, template.score)
        };
        let up_origin = to_origin(up_start, up_strand, up);
        let down_origin = to_origin(down_start, down_strand, down);

        let ((read1, origin1), (read2, origin2)) = if pair.first_upstream {
            ((up_end, up_origin), (down_end, down_origin))
        } else {
            ((down_end, down_origin), (up_end, up_origin))
        };
        let name = SyntheticName::paired(origin1, origin2, kind).encode()?;
        Ok(SimulatedReads::Paired(
            Read::new(name.clone(), read1.seq, read1.qual),
            Read::new(name, read2.seq, read2.qual),
        ))
    }

    fn simulate_end(&mut self, template: &ReadTemplate) -> Result<(MutatedRead, MateOrigin)> {
        let sub = self.sequences.sample(template.reference_span(), &mut self.rng)?;
        let read = self.mutator.mutate(&sub.seq, sub.strand, template, &mut self.rng)?;
        let origin = MateOrigin::new(&sub.ref_name, sub.strand, sub.offset as u64, template.score);
        Ok((read, origin))
    }

    /// Mutate the forward-strand window of `fragment` at `start` as a read on `strand`
    fn cut_mate(
        &mut self,
        fragment: &[u8],
        start: usize,
        strand: Strand,
        template: &ReadTemplate,
    ) -> Result<MutatedRead> {
        let window = &fragment[start..start + template.reference_span()];
        let oriented = match strand {
            Strand::Forward => window.to_vec(),
            Strand::Reverse => reverse_complement(window),
        };
        self.mutator.mutate(&oriented, strand, template, &mut self.rng)
    }
}

fn random_bases<R: Rng>(len: usize, rng: &mut R) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
}

/// `qual` cut or padded with its last value to exactly `len`
fn fit_quality(qual: &[u8], len: usize) -> Vec<u8> {
    let fill = qual.last().copied().unwrap_or(MISSING_QUALITY_FILL);
    let mut fitted: Vec<u8> = qual.iter().copied().take(len).collect();
    fitted.resize(len, fill);
    fitted
}
