use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tandem_core::models::{AlignmentKind, AlignmentRecord};
use tandem_core::{Result, TandemError};

use crate::config::TandemConfig;
use crate::dists::{PairAddOutcome, ScoreDistribution, ScorePairDistribution};
use crate::template::{PairTemplate, ReadTemplate};

///
/// One unit of training input: an unpaired alignment, the aligned end of a
/// pair whose other end failed to align, or both ends of a pair.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingItem {
    Unpaired(AlignmentRecord),
    BadEnd(AlignmentRecord),
    Concordant(AlignmentRecord, AlignmentRecord),
    Discordant(AlignmentRecord, AlignmentRecord),
}

impl TrainingItem {
    pub fn kind(&self) -> AlignmentKind {
        match self {
            TrainingItem::Unpaired(_) => AlignmentKind::Unpaired,
            TrainingItem::BadEnd(_) => AlignmentKind::BadEnd,
            TrainingItem::Concordant(..) => AlignmentKind::Concordant,
            TrainingItem::Discordant(..) => AlignmentKind::Discordant,
        }
    }

    /// Build the template(s) for this item without touching any reservoir
    fn parse(&self) -> Result<ParsedItem> {
        let pair = |a: &AlignmentRecord, b: &AlignmentRecord| -> Result<ParsedPair> {
            let (mate1, mate2) = if !a.is_mate1 && b.is_mate1 { (b, a) } else { (a, b) };
            Ok((PairTemplate::from_records(a, b)?, (mate1.correct, mate2.correct)))
        };
        Ok(match self {
            TrainingItem::Unpaired(rec) => {
                ParsedItem::Unpaired(ReadTemplate::from_record(rec)?, rec.correct)
            }
            TrainingItem::BadEnd(rec) => {
                ParsedItem::BadEnd(ReadTemplate::from_record(rec)?, rec.correct)
            }
            TrainingItem::Concordant(a, b) => ParsedItem::Concordant(pair(a, b)?),
            TrainingItem::Discordant(a, b) => ParsedItem::Discordant(pair(a, b)?),
        })
    }
}

/// Pair template (`None` when the mates aligned to different references)
/// and both mates' correctness labels
type ParsedPair = (Option<PairTemplate>, (Option<bool>, Option<bool>));

enum ParsedItem {
    Unpaired(ReadTemplate, Option<bool>),
    BadEnd(ReadTemplate, Option<bool>),
    Concordant(ParsedPair),
    Discordant(ParsedPair),
}

///
/// Size and length statistics of one distribution in a finalized model.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub kind: AlignmentKind,
    pub num_added: u64,
    /// Longest reference span (unpaired) or fragment (pairs)
    pub max_length: usize,
    pub average_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub distributions: Vec<DistributionSummary>,
    pub num_skipped_records: u64,
}

impl ModelSummary {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TandemError::Serialization(e.to_string()))
    }
}

///
/// Everything learned from the real alignments: one distribution per
/// alignment outcome.
///
#[derive(Debug, Serialize, Deserialize)]
pub struct InputModel {
    pub unpaired: ScoreDistribution,
    pub bad_end: ScoreDistribution,
    pub concordant: ScorePairDistribution,
    pub discordant: ScorePairDistribution,
    num_skipped_records: u64,
    finalized: bool,
}

impl InputModel {
    pub fn new(config: &TandemConfig) -> Self {
        let unp = config.unpaired_params();
        let pair = config.pair_params();
        Self {
            unpaired: ScoreDistribution::new(AlignmentKind::Unpaired.label(), unp),
            bad_end: ScoreDistribution::new(AlignmentKind::BadEnd.label(), unp),
            concordant: ScorePairDistribution::new(
                AlignmentKind::Concordant.label(),
                pair,
                config.max_allowed_fraglen,
            ),
            discordant: ScorePairDistribution::new(
                AlignmentKind::Discordant.label(),
                pair,
                config.max_allowed_fraglen,
            ),
            num_skipped_records: 0,
            finalized: false,
        }
    }

    pub fn add_unpaired<R: Rng>(&mut self, rec: &AlignmentRecord, rng: &mut R) -> Result<()> {
        self.unpaired.add(rec, rng)
    }

    pub fn add_bad_end<R: Rng>(&mut self, rec: &AlignmentRecord, rng: &mut R) -> Result<()> {
        self.bad_end.add(rec, rng)
    }

    pub fn add_concordant<R: Rng>(
        &mut self,
        a: &AlignmentRecord,
        b: &AlignmentRecord,
        rng: &mut R,
    ) -> Result<PairAddOutcome> {
        self.concordant.add(a, b, rng)
    }

    pub fn add_discordant<R: Rng>(
        &mut self,
        a: &AlignmentRecord,
        b: &AlignmentRecord,
        rng: &mut R,
    ) -> Result<PairAddOutcome> {
        self.discordant.add(a, b, rng)
    }

    ///
    /// Add one training item, logging and skipping it if its CIGAR or MD:Z
    /// is malformed. Any other error is returned.
    ///
    pub fn ingest<R: Rng>(&mut self, item: &TrainingItem, rng: &mut R) -> Result<()> {
        let parsed = item.parse();
        self.ingest_parsed(item.kind(), parsed, rng)
    }

    ///
    /// Add many training items. Templates are built in parallel, then
    /// sampled in input order, so the result is the same as calling
    /// [`InputModel::ingest`] on each item in turn.
    ///
    pub fn ingest_all<R: Rng>(&mut self, items: &[TrainingItem], rng: &mut R) -> Result<()> {
        let parsed: Vec<Result<ParsedItem>> = items.par_iter().map(TrainingItem::parse).collect();
        for (item, parsed) in items.iter().zip(parsed) {
            self.ingest_parsed(item.kind(), parsed, rng)?;
        }
        Ok(())
    }

    fn ingest_parsed<R: Rng>(
        &mut self,
        kind: AlignmentKind,
        parsed: Result<ParsedItem>,
        rng: &mut R,
    ) -> Result<()> {
        if self.finalized {
            return Err(TandemError::AlreadyFinalized);
        }
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) if e.is_record_error() => {
                warn!("Skipping {} alignment: {}", kind, e);
                self.num_skipped_records += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let (dist, (pair, correct)) = match parsed {
            ParsedItem::Unpaired(t, correct) => return self.unpaired.add_template(t, correct, rng),
            ParsedItem::BadEnd(t, correct) => return self.bad_end.add_template(t, correct, rng),
            ParsedItem::Concordant(parsed) => (&mut self.concordant, parsed),
            ParsedItem::Discordant(parsed) => (&mut self.discordant, parsed),
        };
        let outcome = match pair {
            Some(pair) => dist.add_pair(pair, correct, rng)?,
            None => dist.record_different_references(),
        };
        if let PairAddOutcome::FragmentTooLong(fraglen) = outcome {
            warn!(
                "Skipping {} pair with fragment length {} (max {})",
                kind,
                fraglen,
                dist.max_allowed_fraglen()
            );
        }
        Ok(())
    }

    pub fn finalize(&mut self) {
        self.unpaired.finalize();
        self.bad_end.finalize();
        self.concordant.finalize();
        self.discordant.finalize();
        self.finalized = true;
        info!(
            "Input model: {} unpaired, {} bad-end, {} concordant, {} discordant ({} records skipped)",
            self.unpaired.num_added(),
            self.bad_end.num_added(),
            self.concordant.num_added(),
            self.discordant.num_added(),
            self.num_skipped_records
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn num_skipped_records(&self) -> u64 {
        self.num_skipped_records
    }

    /// Number of training items of each kind that made it into the model
    pub fn count(&self, kind: AlignmentKind) -> u64 {
        match kind {
            AlignmentKind::Unpaired => self.unpaired.num_added(),
            AlignmentKind::BadEnd => self.bad_end.num_added(),
            AlignmentKind::Concordant => self.concordant.num_added(),
            AlignmentKind::Discordant => self.discordant.num_added(),
        }
    }

    pub fn has(&self, kind: AlignmentKind) -> bool {
        self.count(kind) > 0
    }

    pub fn has_pairs(&self) -> bool {
        self.has(AlignmentKind::Concordant) || self.has(AlignmentKind::Discordant)
    }

    /// Longest reference span among unpaired and bad-end alignments
    pub fn longest_unpaired(&self) -> usize {
        self.unpaired
            .max_observed_length()
            .max(self.bad_end.max_observed_length())
    }

    pub fn longest_fragment(&self) -> usize {
        self.concordant
            .max_observed_length()
            .max(self.discordant.max_observed_length())
    }

    pub fn summary(&self) -> ModelSummary {
        let distributions = AlignmentKind::ALL
            .iter()
            .map(|&kind| {
                let (max_length, average_length) = match kind {
                    AlignmentKind::Unpaired => self.unpaired.length_stats(),
                    AlignmentKind::BadEnd => self.bad_end.length_stats(),
                    AlignmentKind::Concordant => self.concordant.length_stats(),
                    AlignmentKind::Discordant => self.discordant.length_stats(),
                };
                DistributionSummary {
                    kind,
                    num_added: self.count(kind),
                    max_length,
                    average_length,
                }
            })
            .collect();
        ModelSummary {
            distributions,
            num_skipped_records: self.num_skipped_records,
        }
    }

    ///
    /// Write a finalized model to disk. Correctness observers are not saved.
    ///
    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.finalized {
            return Err(TandemError::NotFinalized);
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)
            .map_err(|e| TandemError::Serialization(e.to_string()))?;
        info!("Saved input model to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = bincode::deserialize_from(reader)
            .map_err(|e| TandemError::Serialization(e.to_string()))?;
        if !model.finalized {
            return Err(TandemError::NotFinalized);
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;
    use tandem_core::models::Strand;
    use tempfile::tempdir;

    fn rec(pos: u64, strand: Strand, mate1: bool) -> AlignmentRecord {
        AlignmentRecord::new("chr1", pos, strand, -2, "8M", "3T4", "ACGAACGT", "IIIIIIII").with_mate1(mate1)
    }

    #[fixture]
    fn items() -> Vec<TrainingItem> {
        vec![
            TrainingItem::Unpaired(rec(0, Strand::Forward, true)),
            TrainingItem::Unpaired(rec(40, Strand::Reverse, true)),
            TrainingItem::BadEnd(rec(80, Strand::Forward, false).with_opposite_len(12)),
            TrainingItem::Concordant(rec(100, Strand::Forward, true), rec(150, Strand::Reverse, false)),
            TrainingItem::Discordant(rec(300, Strand::Forward, true), rec(200_000, Strand::Forward, false)),
        ]
    }

    #[rstest]
    fn test_ingest_and_counts(items: Vec<TrainingItem>) {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = InputModel::new(&TandemConfig::default());
        for item in &items {
            model.ingest(item, &mut rng).unwrap();
        }
        model.finalize();

        assert_eq!(model.count(AlignmentKind::Unpaired), 2);
        assert_eq!(model.count(AlignmentKind::BadEnd), 1);
        assert_eq!(model.count(AlignmentKind::Concordant), 1);
        // fragment over max_allowed_fraglen
        assert_eq!(model.count(AlignmentKind::Discordant), 0);
        assert!(model.has_pairs());
        assert_eq!(model.longest_unpaired(), 8);
        assert_eq!(model.longest_fragment(), 58);
    }

    #[rstest]
    fn test_malformed_records_are_skipped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = InputModel::new(&TandemConfig::default());
        let mut bad = rec(0, Strand::Forward, true);
        bad.mdz = "3T4^".to_string();
        model.ingest(&TrainingItem::Unpaired(bad), &mut rng).unwrap();
        assert_eq!(model.num_skipped_records(), 1);
        assert_eq!(model.count(AlignmentKind::Unpaired), 0);
    }

    #[rstest]
    fn test_lifecycle_errors_propagate(items: Vec<TrainingItem>) {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = InputModel::new(&TandemConfig::default());
        model.finalize();
        assert!(matches!(
            model.ingest(&items[0], &mut rng),
            Err(TandemError::AlreadyFinalized)
        ));
    }

    #[rstest]
    fn test_ingest_all_matches_sequential(items: Vec<TrainingItem>) {
        let config = TandemConfig::default().with_fraction_even(0.5);

        let mut sequential = InputModel::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        for item in &items {
            sequential.ingest(item, &mut rng).unwrap();
        }
        let mut batched = InputModel::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        batched.ingest_all(&items, &mut rng).unwrap();

        sequential.finalize();
        batched.finalize();
        for kind in AlignmentKind::ALL {
            assert_eq!(sequential.count(kind), batched.count(kind));
        }
        assert_eq!(batched.discordant.num_skipped(), 1);

        let mut r1 = StdRng::seed_from_u64(3);
        let mut r2 = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(
                sequential.unpaired.draw(&mut r1).unwrap(),
                batched.unpaired.draw(&mut r2).unwrap()
            );
        }
    }

    #[rstest]
    fn test_summary(items: Vec<TrainingItem>) {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = InputModel::new(&TandemConfig::default());
        model.ingest_all(&items, &mut rng).unwrap();
        model.finalize();

        let summary = model.summary();
        assert_eq!(summary.distributions.len(), 4);
        let conc = &summary.distributions[2];
        assert_eq!(conc.kind, AlignmentKind::Concordant);
        assert_eq!((conc.num_added, conc.max_length), (1, 58));
        assert_eq!(conc.average_length, Some(58.0));

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["distributions"][0]["num_added"], 2);
        assert_eq!(json["num_skipped_records"], 0);
    }

    #[rstest]
    fn test_save_and_load(items: Vec<TrainingItem>) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = InputModel::new(&TandemConfig::default().with_fraction_even(0.5));

        assert!(matches!(model.save(&path), Err(TandemError::NotFinalized)));
        for item in &items {
            model.ingest(item, &mut rng).unwrap();
        }
        model.finalize();
        model.save(&path).unwrap();

        let mut loaded = InputModel::load(&path).unwrap();
        assert_eq!(loaded.count(AlignmentKind::Unpaired), 2);
        assert_eq!(loaded.longest_fragment(), 58);
        assert_eq!(loaded.concordant.average_length(), Some(58.0));
        let pair = loaded.concordant.draw(&mut rng).unwrap();
        assert_eq!(pair.fragment_length, 58);
    }
}
