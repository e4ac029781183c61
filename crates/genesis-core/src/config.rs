//! Compliance configuration.
//!
//! One immutable value per analysis run. It is validated once, before any
//! worker starts, and then only read.

use std::collections::BTreeSet;

use genesis_bonds::toxicity::ToxicityConfig;
use genesis_codon::grammar::CodonPattern;
use genesis_codon::validate::MatchOptions;
use serde::{Deserialize, Serialize};

/// Allowed drift of the weight sum from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Score weight '{name}' out of range [0, 1]: {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("Score weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("Toxicity threshold out of range [0, 1]: {0}")]
    ThresholdOutOfRange(f64),

    #[error("Minimum overall score out of range [0, 100]: {0}")]
    MinScoreOutOfRange(f64),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Relative weight of each sub-score in a component's overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub pattern: f64,
    pub bonds: f64,
    pub hubs: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            pattern: 0.5,
            bonds: 0.3,
            hubs: 0.2,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("pattern", self.pattern),
            ("bonds", self.bonds),
            ("hubs", self.hubs),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }
        let sum = self.pattern + self.bonds + self.hubs;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Require full coverage and fail on warnings.
    pub strict_mode: bool,
    pub toxicity_threshold: f64,
    pub score_weights: ScoreWeights,
    /// When non-empty, every component must match one of these.
    pub required_patterns: BTreeSet<CodonPattern>,
    /// Lowest overall score (0-100) a component may have and still pass.
    pub min_overall_score: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            toxicity_threshold: ToxicityConfig::default().toxicity_threshold,
            score_weights: ScoreWeights::default(),
            required_patterns: BTreeSet::new(),
            min_overall_score: 70.0,
        }
    }
}

impl ComplianceConfig {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.score_weights.validate()?;
        if !(0.0..=1.0).contains(&self.toxicity_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.toxicity_threshold));
        }
        if !(0.0..=100.0).contains(&self.min_overall_score) {
            return Err(ConfigError::MinScoreOutOfRange(self.min_overall_score));
        }
        Ok(())
    }

    pub fn min_coverage(&self) -> f64 {
        if self.strict_mode {
            1.0
        } else {
            0.5
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            min_coverage: self.min_coverage(),
            required_patterns: self.required_patterns.clone(),
        }
    }

    pub fn toxicity_config(&self) -> ToxicityConfig {
        ToxicityConfig {
            toxicity_threshold: self.toxicity_threshold,
        }
    }
}

/// Parse and validate a configuration document. Missing fields take
/// their defaults.
pub fn parse_config(json: &str) -> Result<ComplianceConfig, ConfigError> {
    let config: ComplianceConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
