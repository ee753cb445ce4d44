//! Suitability and Risk Scoring
//!
//! Scalar suitability as a weighted sum of pH, soil organic carbon, and
//! moisture, plus a derived risk score normalized against the batch maximum.
//!
//! The original formula treated a missing input as a zero contribution,
//! which penalizes incomplete records. That behavior is kept as the default
//! (`MissingPolicy::ZeroMissing`) with an explicit alternative that
//! renormalizes over the present terms (`MissingPolicy::ExcludeMissing`).

use crate::error::{EngineError, Result};
use crate::records::SoilSample;
use serde::{Deserialize, Serialize};

/// Term weights for the suitability formula; expected to sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuitabilityWeights {
    pub ph: f64,
    pub soc: f64,
    pub moisture: f64,
}

impl Default for SuitabilityWeights {
    fn default() -> Self {
        SuitabilityWeights {
            ph: 0.4,
            soc: 0.3,
            moisture: 0.3,
        }
    }
}

impl SuitabilityWeights {
    pub fn sum(&self) -> f64 {
        self.ph + self.soc + self.moisture
    }
}

/// Treatment of missing pH/SOC/moisture inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Missing input contributes 0 to its term (original behavior)
    #[default]
    ZeroMissing,

    /// Missing terms are dropped and the weighted sum is renormalized over
    /// the weights that remain; a fully-empty record scores 0
    ExcludeMissing,
}

/// Classified risk level, from fixed cut points on the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn display_text(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

/// Risk score with its classification
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
}

/// Weighted suitability score for one sample
pub fn suitability(sample: &SoilSample, weights: &SuitabilityWeights, policy: MissingPolicy) -> f64 {
    let terms = [
        (weights.ph, sample.ph),
        (weights.soc, sample.soc),
        (weights.moisture, sample.moisture),
    ];

    match policy {
        MissingPolicy::ZeroMissing => terms
            .iter()
            .map(|(w, v)| w * v.unwrap_or(0.0))
            .sum(),
        MissingPolicy::ExcludeMissing => {
            let mut weighted = 0.0;
            let mut weight_sum = 0.0;
            for (w, v) in terms {
                if let Some(v) = v {
                    weighted += w * v;
                    weight_sum += w;
                }
            }
            if weight_sum <= 0.0 {
                0.0
            } else {
                weighted / weight_sum
            }
        }
    }
}

/// Classify a risk score by fixed cut points.
///
/// Half-open, lower-inclusive brackets: [0, 0.3) Low, [0.3, 0.6) Moderate,
/// [0.6, ..) High.
pub fn classify_risk(score: f64) -> RiskLevel {
    if score < 0.3 {
        RiskLevel::Low
    } else if score < 0.6 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// Risk for one sample, normalized against the batch suitability maximum.
///
/// `risk = 1 - suitability / max_in_batch`; the caller supplies the batch
/// maximum as a precondition. Fails with a validation error when the
/// maximum is non-positive — that failure is structural and aborts the
/// whole batch, per the propagation policy.
pub fn risk(
    sample: &SoilSample,
    max_suitability_in_batch: f64,
    weights: &SuitabilityWeights,
    policy: MissingPolicy,
) -> Result<RiskAssessment> {
    if max_suitability_in_batch <= 0.0 {
        return Err(EngineError::validation(format!(
            "non-positive batch suitability maximum: {}",
            max_suitability_in_batch
        )));
    }

    let score = 1.0 - suitability(sample, weights, policy) / max_suitability_in_batch;
    Ok(RiskAssessment {
        score,
        level: classify_risk(score),
    })
}
