pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quality assigned to every base when an alignment carries no qualities
pub const MISSING_QUALITY_FILL: u8 = b'I';

pub const DEFAULT_SEED: u64 = 99099;
pub const DEFAULT_INPUT_MODEL_SIZE: usize = 10_000;
pub const DEFAULT_PER_SCORE_SIZE: usize = 100;
pub const DEFAULT_PER_SCORE_PAIR_SIZE: usize = 30;
pub const DEFAULT_FRACTION_EVEN: f64 = 1.0;
pub const DEFAULT_LOW_SCORE_BIAS: f64 = 1.0;
pub const DEFAULT_MAX_ALLOWED_FRAGLEN: usize = 100_000;
pub const DEFAULT_MAX_SAMPLE_ATTEMPTS: usize = 10_000;
pub const DEFAULT_PERFECT_SCORE: i64 = 0;

pub const DEFAULT_SIM_FRACTION: f64 = 0.01;
pub const DEFAULT_SIM_UNP_MIN: usize = 30_000;
pub const DEFAULT_SIM_CONC_MIN: usize = 30_000;
pub const DEFAULT_SIM_DISC_MIN: usize = 10_000;
pub const DEFAULT_SIM_BAD_END_MIN: usize = 10_000;
pub const DEFAULT_WIGGLE: u64 = 30;

/// How often simulation progress is logged, in reads or pairs
pub const PROGRESS_INTERVAL: u64 = 20_000;

pub const TRAIN_CMD: &str = "train";
pub const SIMULATE_CMD: &str = "simulate";
pub const CONFIG_CMD: &str = "config";

pub const DEFAULT_MODEL_OUT: &str = "tandem.model";
pub const DEFAULT_READS_OUT: &str = "tandem_reads";
pub const DEFAULT_CONFIG_OUT: &str = "tandem.toml";
