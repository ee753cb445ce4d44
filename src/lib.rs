//! Biochar Suitability Scorer (Rust)
//!
//! Estimates where biochar application is agronomically favorable by scoring
//! soil samples against candidate biochar materials and summarizing results
//! over a hexagonal (H3) spatial grid.
//!
//! - `spatial`: coordinate <-> hexagonal cell encoding
//! - `scoring`: threshold candidate matching and suitability/risk scoring
//! - `aggregate`: per-cell roll-up with weighted and merge variants
//! - `data`: canonical-schema CSV loading
//! - `pipeline`: batch coordinator wiring the above together

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod scoring;
pub mod spatial;

// Re-export commonly used types
pub use aggregate::{aggregate_by_cell, merge_aggregates, summarize_cells, weighted_aggregate, CellSummary};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use pipeline::{BatchOutcome, MatchingEngine, SampleScore};
pub use records::{BiocharCandidate, CandidateSet, SoilSample};
pub use scoring::{
    classify_risk, rank, rank_for_many, risk, score, suitability, MatchResult, MissingPolicy,
    RiskLevel, SuitabilityWeights, ThresholdCriterion, SCORE_CEILING,
};
