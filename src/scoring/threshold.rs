//! Threshold Scoring Engine
//!
//! Scores biochar candidates against a soil sample over a table of
//! independent criteria. Each criterion awards full points inside an ideal
//! sub-range, linearly decaying partial points inside a wider acceptable
//! range, and zero outside. Criterion point values are configuration data;
//! their sum is pinned to the 20-point ceiling by config validation.
//!
//! A criterion that cannot be evaluated (missing soil value, or missing
//! candidate threshold for a window criterion) contributes `None` to the
//! breakdown: no credit, no penalty, distinguishable from an explicit zero.

use crate::error::{EngineError, Result};
use crate::records::{BiocharCandidate, CandidateField, SoilProperty, SoilSample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Fixed ceiling for the cumulative match score
pub const SCORE_CEILING: f64 = 20.0;

/// How a criterion derives its acceptable range or match set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionRule {
    /// Soil value scored against a window centred on a candidate field.
    /// Ideal = centre ± `ideal`, acceptable = centre ± `acceptable`.
    /// Unscorable when the candidate lacks the field.
    CandidateWindow {
        soil: SoilProperty,
        field: CandidateField,
        ideal: f64,
        acceptable: f64,
    },

    /// Soil value scored against a fixed band, identical for every candidate
    FixedBand {
        soil: SoilProperty,
        ideal_min: f64,
        ideal_max: f64,
        acceptable_min: f64,
        acceptable_max: f64,
    },

    /// Soil texture class scored against an accepted set (exact match,
    /// case-insensitive)
    TextureMatch { accepted: Vec<String> },
}

/// One independent scoring rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdCriterion {
    /// Breakdown key, e.g. "ph"
    pub name: String,

    /// Points contributed when fully satisfied
    pub points: f64,

    pub rule: CriterionRule,
}

impl ThresholdCriterion {
    /// Evaluate against one sample/candidate pair.
    ///
    /// Returns `None` when the criterion is unscorable, `Some(points)` in
    /// [0, self.points] otherwise.
    pub fn evaluate(&self, sample: &SoilSample, candidate: &BiocharCandidate) -> Option<f64> {
        match &self.rule {
            CriterionRule::CandidateWindow {
                soil,
                field,
                ideal,
                acceptable,
            } => {
                let value = sample.property(*soil)?;
                let centre = candidate.field(*field)?;
                Some(self.banded_score(
                    value,
                    centre - ideal,
                    centre + ideal,
                    centre - acceptable,
                    centre + acceptable,
                ))
            }
            CriterionRule::FixedBand {
                soil,
                ideal_min,
                ideal_max,
                acceptable_min,
                acceptable_max,
            } => {
                let value = sample.property(*soil)?;
                Some(self.banded_score(
                    value,
                    *ideal_min,
                    *ideal_max,
                    *acceptable_min,
                    *acceptable_max,
                ))
            }
            CriterionRule::TextureMatch { accepted } => {
                let texture = sample.texture.as_deref()?;
                let hit = accepted.iter().any(|t| t.eq_ignore_ascii_case(texture));
                Some(if hit { self.points } else { 0.0 })
            }
        }
    }

    /// Full points inside [ideal_min, ideal_max], linear decay from the
    /// ideal edge to the acceptable edge, zero beyond it.
    fn banded_score(
        &self,
        value: f64,
        ideal_min: f64,
        ideal_max: f64,
        acceptable_min: f64,
        acceptable_max: f64,
    ) -> f64 {
        if value >= ideal_min && value <= ideal_max {
            return self.points;
        }
        if value < acceptable_min || value > acceptable_max {
            return 0.0;
        }

        let (distance, margin) = if value < ideal_min {
            (ideal_min - value, ideal_min - acceptable_min)
        } else {
            (value - ideal_max, acceptable_max - ideal_max)
        };
        if margin <= 0.0 {
            return 0.0;
        }

        (self.points * (1.0 - distance / margin)).max(0.0)
    }
}

/// Scored outcome of one sample/candidate pair
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub sample_id: String,
    pub candidate_id: String,

    /// Cumulative score, invariantly in [0, 20]
    pub total: f64,

    /// Per-criterion contribution; `None` marks an unscorable criterion
    /// (missing data), distinct from an explicit `Some(0.0)`
    pub breakdown: BTreeMap<String, Option<f64>>,
}

impl MatchResult {
    /// Number of criteria that actually produced a contribution
    pub fn scored_criteria(&self) -> usize {
        self.breakdown.values().filter(|c| c.is_some()).count()
    }
}

/// Score one candidate against one sample over the criterion table
pub fn score(
    sample: &SoilSample,
    candidate: &BiocharCandidate,
    criteria: &[ThresholdCriterion],
) -> MatchResult {
    let contributions: SmallVec<[(String, Option<f64>); 8]> = criteria
        .iter()
        .map(|c| (c.name.clone(), c.evaluate(sample, candidate)))
        .collect();

    let total = contributions
        .iter()
        .filter_map(|(_, c)| *c)
        .sum::<f64>()
        .min(SCORE_CEILING);

    MatchResult {
        sample_id: sample.id.clone(),
        candidate_id: candidate.id.clone(),
        total,
        breakdown: contributions.into_iter().collect(),
    }
}

/// Rank all candidates for one sample.
///
/// Descending total score, ties broken by candidate id ascending, so the
/// ordering is stable and deterministic regardless of input order.
///
/// Fails with a validation error on an empty candidate list. Returns an
/// empty Vec (not an error) when no candidate has a single scorable
/// criterion; callers taking the top-N must check for this.
pub fn rank(
    sample: &SoilSample,
    candidates: &[BiocharCandidate],
    criteria: &[ThresholdCriterion],
) -> Result<Vec<MatchResult>> {
    if candidates.is_empty() {
        return Err(EngineError::validation("candidate list is empty"));
    }

    let mut results: Vec<MatchResult> = candidates
        .iter()
        .map(|c| score(sample, c, criteria))
        .collect();

    if results.iter().all(|r| r.scored_criteria() == 0) {
        return Ok(Vec::new());
    }

    results.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    Ok(results)
}

/// Rank candidates for many samples independently.
///
/// Per-sample scoring has no cross-sample dependency, so samples fan out
/// across the Rayon pool; output concatenation follows input sample order
/// regardless of completion order.
pub fn rank_for_many(
    samples: &[SoilSample],
    candidates: &[BiocharCandidate],
    criteria: &[ThresholdCriterion],
) -> Result<Vec<MatchResult>> {
    if candidates.is_empty() {
        return Err(EngineError::validation("candidate list is empty"));
    }

    let per_sample: Vec<Vec<MatchResult>> = samples
        .par_iter()
        .map(|sample| rank(sample, candidates, criteria).unwrap_or_default())
        .collect();

    Ok(per_sample.into_iter().flatten().collect())
}

/// Default criterion table.
///
/// Illustrative bands summing to the 20-point ceiling; deployments supply
/// their own table through the engine config.
pub fn default_criteria() -> Vec<ThresholdCriterion> {
    vec![
        ThresholdCriterion {
            name: "ph".to_string(),
            points: 6.0,
            rule: CriterionRule::CandidateWindow {
                soil: SoilProperty::Ph,
                field: CandidateField::Ph,
                ideal: 0.5,
                acceptable: 1.5,
            },
        },
        ThresholdCriterion {
            name: "moisture".to_string(),
            points: 4.0,
            rule: CriterionRule::CandidateWindow {
                soil: SoilProperty::Moisture,
                field: CandidateField::Moisture,
                ideal: 10.0,
                acceptable: 25.0,
            },
        },
        ThresholdCriterion {
            name: "texture".to_string(),
            points: 4.0,
            rule: CriterionRule::TextureMatch {
                accepted: vec![
                    "sand".to_string(),
                    "loamy sand".to_string(),
                    "sandy loam".to_string(),
                    "loam".to_string(),
                ],
            },
        },
        // Low-carbon soils gain the most from amendment
        ThresholdCriterion {
            name: "soc".to_string(),
            points: 3.0,
            rule: CriterionRule::FixedBand {
                soil: SoilProperty::Soc,
                ideal_min: 0.0,
                ideal_max: 1.5,
                acceptable_min: 0.0,
                acceptable_max: 3.0,
            },
        },
        ThresholdCriterion {
            name: "ec".to_string(),
            points: 3.0,
            rule: CriterionRule::FixedBand {
                soil: SoilProperty::Ec,
                ideal_min: 0.0,
                ideal_max: 2.0,
                acceptable_min: 0.0,
                acceptable_max: 4.0,
            },
        },
    ]
}
