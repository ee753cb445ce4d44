//! Scoring Engines
//!
//! - `threshold`: multi-criterion candidate matching with the 20-point
//!   ceiling and deterministic ranking
//! - `suitability`: weighted scalar suitability and classified risk

pub mod suitability;
pub mod threshold;

pub use suitability::{
    classify_risk, risk, suitability, MissingPolicy, RiskAssessment, RiskLevel,
    SuitabilityWeights,
};
pub use threshold::{
    default_criteria, rank, rank_for_many, score, CriterionRule, MatchResult,
    ThresholdCriterion, SCORE_CEILING,
};
