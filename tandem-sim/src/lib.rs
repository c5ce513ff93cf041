//! # tandem-sim: alignment-profile driven read simulation
//!
//! Learns what real alignments look like (their scores, edits, qualities and
//! fragment lengths) and generates synthetic reads that reproduce those
//! profiles at known positions of a reference genome. Re-aligning the
//! synthetic reads yields labelled training data for mapping quality
//! prediction, since each read's true origin travels in its name.
//!
//! ## Workflow
//!
//! 1. Feed aligned records to an [`InputModel`], which parses each CIGAR and
//!    MD:Z pair into a stacked alignment and keeps a score-stratified sample
//!    of the resulting templates.
//! 2. Finalize the model, optionally saving it with [`InputModel::save`].
//! 3. Build a [`SimulatorWrapper`] over the model and a reference, and draw
//!    reads from it one at a time or in batches.
//!
//! ```rust,ignore
//! use tandem_sim::{InputModel, SimulatorWrapper, TandemConfig, BatchPlan};
//! use tandem_sim::reference::InMemoryReference;
//!
//! let config = TandemConfig::default();
//! let mut model = InputModel::new(&config);
//! for item in tandem_sim::io::read_training_items(path)? {
//!     model.ingest(&item, &mut rng)?;
//! }
//! model.finalize();
//!
//! let reference = InMemoryReference::from_fasta(fasta)?;
//! let plan = BatchPlan::from_model(&model, &config);
//! let mut sim = SimulatorWrapper::new(model, reference, &config)?;
//! sim.simulate_batch(&plan, |kind, reads| writer.write(kind, &reads))?;
//! ```
pub mod cigar;
pub mod config;
pub mod consts;
pub mod dists;
pub mod io;
pub mod model;
pub mod mutate;
pub mod read_name;
pub mod reference;
pub mod sampling;
pub mod sequence;
pub mod simulator;
pub mod stacked;
pub mod template;

pub use config::TandemConfig;
pub use model::{InputModel, TrainingItem};
pub use mutate::{MutatedRead, ReadMutator};
pub use read_name::{MateOrigin, SyntheticName};
pub use reference::{InMemoryReference, ReferenceProvider};
pub use sequence::{SampledSubstring, SequenceSimulator};
pub use simulator::{BatchPlan, SimulatedReads, SimulationCounts, SimulatorWrapper};
pub use stacked::StackedAlignment;
pub use template::{PairTemplate, ReadTemplate};
