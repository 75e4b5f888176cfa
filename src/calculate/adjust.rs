//! Score-adjustment weights for shot attempts.
//!
//! Trailing teams shoot more and leading teams shoot less. Each score
//! situation carries a multiplier that neutralizes that effect: attempts
//! for are weighted by the entity's own score situation, attempts against
//! by its negation.

use std::collections::BTreeMap;

use crate::config::{ConfigError, ScoreAdjustmentConfig};

/// Default weights for score situations -3 through +3.
pub const DEFAULT_WEIGHTS: [(i32, f64); 7] = [
    (-3, 0.826),
    (-2, 0.859),
    (-1, 0.902),
    (0, 1.0),
    (1, 1.120),
    (2, 1.178),
    (3, 1.215),
];

/// Validated lookup from score situation to weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAdjustment {
    weights: BTreeMap<i32, f64>,
}

impl Default for ScoreAdjustment {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.into_iter().collect(),
        }
    }
}

/// Check a weight table: non-empty, every weight finite and positive, and
/// every situation's negation present.
pub fn check_weight_table(weights: &BTreeMap<i32, f64>) -> Result<(), ConfigError> {
    if weights.is_empty() {
        return Err(ConfigError::ValidationError(
            "score adjustment table is empty".to_string(),
        ));
    }

    for (&situation, &weight) in weights {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "weight for score situation {} must be a positive number, got {}",
                situation, weight
            )));
        }
    }

    for situation in weights.keys() {
        if !weights.contains_key(&-situation) {
            return Err(ConfigError::MissingWeight(-situation));
        }
    }

    Ok(())
}

impl ScoreAdjustment {
    pub fn new(weights: BTreeMap<i32, f64>) -> Result<Self, ConfigError> {
        check_weight_table(&weights)?;
        Ok(Self { weights })
    }

    pub fn from_config(config: &ScoreAdjustmentConfig) -> Result<Self, ConfigError> {
        Self::new(config.parsed_weights()?)
    }

    pub fn weight(&self, score_situation: i32) -> Result<f64, ConfigError> {
        self.weights
            .get(&score_situation)
            .copied()
            .ok_or(ConfigError::MissingWeight(score_situation))
    }

    /// Check that every observed situation and its negation has a weight.
    pub fn ensure_covers<I>(&self, score_situations: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = i32>,
    {
        for sit in score_situations {
            self.weight(sit)?;
            self.weight(-sit)?;
        }
        Ok(())
    }

    /// Adjusted (corsi for, corsi against) for one record.
    pub fn adjust(&self, score_situation: i32, cf: u64, ca: u64) -> Result<(f64, f64), ConfigError> {
        let cf_adj = self.weight(score_situation)? * cf as f64;
        let ca_adj = self.weight(-score_situation)? * ca as f64;
        Ok((cf_adj, ca_adj))
    }
}
