use std::path::Path;

use serde::{Deserialize, Serialize};

use tandem_core::{Result, TandemError};

use crate::consts::*;
use crate::dists::SamplingParams;

// ============================================================================
// Configuration Model
// ============================================================================

/// Configuration for training and simulation
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
///
/// # Example
/// ```toml
/// seed = 42
/// input_model_size = 10000
/// fraction_even = 0.5
/// low_score_bias = 4.0
/// sim_unp_min = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TandemConfig {
    pub seed: u64,
    pub input_model_size: usize,
    pub per_score_size: usize,
    pub per_score_pair_size: usize,
    pub fraction_even: f64,
    pub low_score_bias: f64,
    pub max_allowed_fraglen: usize,
    pub max_sample_attempts: usize,
    pub perfect_score: i64,
    pub check_perfect_score: bool,
    pub sim_fraction: f64,
    pub sim_unp_min: usize,
    pub sim_conc_min: usize,
    pub sim_disc_min: usize,
    pub sim_bad_end_min: usize,
    pub wiggle: u64,
}

impl Default for TandemConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            input_model_size: DEFAULT_INPUT_MODEL_SIZE,
            per_score_size: DEFAULT_PER_SCORE_SIZE,
            per_score_pair_size: DEFAULT_PER_SCORE_PAIR_SIZE,
            fraction_even: DEFAULT_FRACTION_EVEN,
            low_score_bias: DEFAULT_LOW_SCORE_BIAS,
            max_allowed_fraglen: DEFAULT_MAX_ALLOWED_FRAGLEN,
            max_sample_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
            perfect_score: DEFAULT_PERFECT_SCORE,
            check_perfect_score: true,
            sim_fraction: DEFAULT_SIM_FRACTION,
            sim_unp_min: DEFAULT_SIM_UNP_MIN,
            sim_conc_min: DEFAULT_SIM_CONC_MIN,
            sim_disc_min: DEFAULT_SIM_DISC_MIN,
            sim_bad_end_min: DEFAULT_SIM_BAD_END_MIN,
            wiggle: DEFAULT_WIGGLE,
        }
    }
}

impl TandemConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fraction_even) {
            return Err(TandemError::InvalidConfig(format!(
                "fraction_even must be in [0, 1], got {}",
                self.fraction_even
            )));
        }
        if self.low_score_bias.is_nan() || self.low_score_bias < 1.0 {
            return Err(TandemError::InvalidConfig(format!(
                "low_score_bias must be at least 1.0, got {}",
                self.low_score_bias
            )));
        }
        if self.input_model_size == 0 || self.per_score_size == 0 || self.per_score_pair_size == 0
        {
            return Err(TandemError::InvalidConfig(
                "reservoir capacities must be positive".to_string(),
            ));
        }
        if self.max_sample_attempts == 0 {
            return Err(TandemError::InvalidConfig(
                "max_sample_attempts must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sim_fraction) {
            return Err(TandemError::InvalidConfig(format!(
                "sim_fraction must be in [0, 1], got {}",
                self.sim_fraction
            )));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fraction_even(mut self, fraction_even: f64) -> Self {
        self.fraction_even = fraction_even;
        self
    }

    pub fn with_low_score_bias(mut self, low_score_bias: f64) -> Self {
        self.low_score_bias = low_score_bias;
        self
    }

    pub fn with_input_model_size(mut self, size: usize) -> Self {
        self.input_model_size = size;
        self
    }

    /// Score meaning "no edits", if the perfect-score check is enabled
    pub fn perfect_score(&self) -> Option<i64> {
        self.check_perfect_score.then_some(self.perfect_score)
    }

    pub fn unpaired_params(&self) -> SamplingParams {
        SamplingParams {
            capacity: self.input_model_size,
            per_score_capacity: self.per_score_size,
            fraction_even: self.fraction_even,
            low_score_bias: self.low_score_bias,
        }
    }

    pub fn pair_params(&self) -> SamplingParams {
        SamplingParams {
            capacity: self.input_model_size,
            per_score_capacity: self.per_score_pair_size,
            fraction_even: self.fraction_even,
            low_score_bias: self.low_score_bias,
        }
    }
}
