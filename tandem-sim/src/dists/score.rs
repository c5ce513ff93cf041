use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use tandem_core::models::AlignmentRecord;
use tandem_core::{Result, TandemError};

use crate::dists::observer::CorrectnessObserver;
use crate::dists::stratified::{SamplingParams, StratifiedReservoir};
use crate::template::ReadTemplate;

///
/// Score-stratified sample of unpaired alignment templates.
///
/// Lifecycle: `add` any number of alignments, `finalize` once, then `draw`.
///
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreDistribution {
    name: String,
    samples: StratifiedReservoir<ReadTemplate>,
    num_added: u64,
    total_reference_span: u64,
    max_reference_span: usize,
    average_length: Option<f64>,
    #[serde(skip)]
    observer: Option<Box<dyn CorrectnessObserver>>,
}

impl ScoreDistribution {
    pub fn new(name: &str, params: SamplingParams) -> Self {
        Self {
            name: name.to_string(),
            samples: StratifiedReservoir::new(params),
            num_added: 0,
            total_reference_span: 0,
            max_reference_span: 0,
            average_length: None,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn CorrectnessObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn CorrectnessObserver>) {
        self.observer = Some(observer);
    }

    /// Parse an alignment into a template and sample it
    pub fn add<R: Rng>(&mut self, rec: &AlignmentRecord, rng: &mut R) -> Result<()> {
        if self.samples.is_finalized() {
            return Err(TandemError::AlreadyFinalized);
        }
        let template = ReadTemplate::from_record(rec)?;
        self.add_template(template, rec.correct, rng)
    }

    ///
    /// Sample an already-parsed template. `correct` is the aligner's
    /// correctness label for the record it came from, if known.
    ///
    pub fn add_template<R: Rng>(
        &mut self,
        template: ReadTemplate,
        correct: Option<bool>,
        rng: &mut R,
    ) -> Result<()> {
        let span = template.reference_span();
        let score = template.score;

        self.samples.add(score, template, rng)?;
        self.num_added += 1;
        self.total_reference_span += span as u64;
        self.max_reference_span = self.max_reference_span.max(span);

        if let (Some(observer), Some(correct)) = (self.observer.as_mut(), correct) {
            observer.on_add(score, correct);
        }
        Ok(())
    }

    pub fn finalize(&mut self) {
        self.samples.finalize();
        if self.num_added > 0 {
            self.average_length = Some(self.total_reference_span as f64 / self.num_added as f64);
        }
        debug!(
            "Finalized {} distribution: {} added, {} distinct scores, max span {}",
            self.name,
            self.num_added,
            self.samples.scores().len(),
            self.max_reference_span
        );
    }

    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Result<&ReadTemplate> {
        if self.num_added == 0 {
            return Err(TandemError::EmptyDistribution(self.name.clone()));
        }
        let template = self.samples.draw(rng)?;
        if let Some(observer) = self.observer.as_mut() {
            observer.on_draw(template.score);
        }
        Ok(template)
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

    /// Longest reference span among added alignments
    pub fn max_observed_length(&self) -> usize {
        self.max_reference_span
    }

    /// Mean reference span, available once finalized and non-empty
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
