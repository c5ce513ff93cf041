pub mod observer;
pub mod pair;
pub mod score;
pub mod shared;
pub mod stratified;

pub use observer::{CorrectnessObserver, ScoreCorrectnessTally};
pub use pair::{PairAddOutcome, ScorePairDistribution};
pub use score::ScoreDistribution;
pub use shared::SharedDistribution;
pub use stratified::{SamplingParams, StratifiedReservoir};
