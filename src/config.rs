//! Engine Configuration
//!
//! One explicit configuration value carries everything the pipeline needs:
//! grid resolution, suitability weights, the missing-input policy, and the
//! threshold criterion table. It is passed into the engine at construction
//! and validated there; no process-wide state.

use crate::error::{EngineError, Result};
use crate::scoring::suitability::{MissingPolicy, SuitabilityWeights};
use crate::scoring::threshold::{default_criteria, ThresholdCriterion, SCORE_CEILING};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default H3 resolution for cell encoding
pub const DEFAULT_RESOLUTION: u8 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// H3 grid resolution used when encoding sample coordinates
    #[serde(default = "default_resolution")]
    pub resolution: u8,

    #[serde(default)]
    pub weights: SuitabilityWeights,

    #[serde(default)]
    pub missing_policy: MissingPolicy,

    /// Threshold criterion table; points must sum to the 20-point ceiling
    #[serde(default = "default_criteria")]
    pub criteria: Vec<ThresholdCriterion>,
}

fn default_resolution() -> u8 {
    DEFAULT_RESOLUTION
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            resolution: DEFAULT_RESOLUTION,
            weights: SuitabilityWeights::default(),
            missing_policy: MissingPolicy::default(),
            criteria: default_criteria(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: EngineConfig =
            serde_json::from_str(&contents).with_context(|| "Failed to parse config JSON")?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {:?}", path))?;

        Ok(config)
    }

    /// Check structural invariants: resolution in the grid's range, weights
    /// summing to 1, non-empty criterion table with non-negative points
    /// summing to the score ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.resolution > 15 {
            return Err(EngineError::validation(format!(
                "grid resolution {} outside [0, 15]",
                self.resolution
            )));
        }

        if (self.weights.sum() - 1.0).abs() > 1e-6 {
            return Err(EngineError::validation(format!(
                "suitability weights sum to {}, expected 1.0",
                self.weights.sum()
            )));
        }

        if self.criteria.is_empty() {
            return Err(EngineError::validation("criterion table is empty"));
        }
        if let Some(bad) = self.criteria.iter().find(|c| c.points < 0.0) {
            return Err(EngineError::validation(format!(
                "criterion '{}' has negative points",
                bad.name
            )));
        }

        let total: f64 = self.criteria.iter().map(|c| c.points).sum();
        if (total - SCORE_CEILING).abs() > 1e-6 {
            return Err(EngineError::validation(format!(
                "criterion points sum to {}, expected {}",
                total, SCORE_CEILING
            )));
        }

        Ok(())
    }
}
