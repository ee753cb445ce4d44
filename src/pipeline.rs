//! Matching Pipeline
//!
//! Coordinator wiring the full run for a batch of soil samples: resolve or
//! encode each sample's cell, rank the candidate set per sample, compute
//! suitability and batch-normalized risk, and summarize per cell.
//!
//! Per-sample scoring has no cross-sample dependency, so the batch fans out
//! over Rayon; risk derivation happens after fan-in because it needs the
//! batch suitability maximum.

use crate::aggregate::{summarize_cells, CellSummary};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::records::{CandidateSet, SoilSample};
use crate::scoring::suitability::{classify_risk, suitability, RiskLevel};
use crate::scoring::threshold::{rank, MatchResult};
use crate::spatial;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{info, warn};

/// Per-sample scored record flowing into aggregation
#[derive(Debug, Clone, Serialize)]
pub struct SampleScore {
    pub sample_id: String,
    /// Resolved cell token; `None` when the sample had neither a cell nor
    /// coordinates
    pub cell: Option<String>,
    pub suitability: f64,
    pub risk: f64,
    pub risk_level: RiskLevel,
}

/// Output of one batch run
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    /// Ranked match results, grouped by sample in input order
    pub matches: Vec<MatchResult>,
    /// Per-sample suitability and risk, in input order
    pub scores: Vec<SampleScore>,
    /// Per-cell summary statistics
    pub cells: FxHashMap<String, CellSummary>,
}

/// Main matching engine
pub struct MatchingEngine {
    config: EngineConfig,
    candidates: CandidateSet,
}

impl MatchingEngine {
    /// Build an engine from a validated config and a non-empty candidate set
    pub fn new(config: EngineConfig, candidates: CandidateSet) -> Result<Self> {
        config.validate()?;
        if candidates.is_empty() {
            return Err(EngineError::validation("candidate list is empty"));
        }

        info!(
            candidates = candidates.len(),
            resolution = config.resolution,
            criteria = config.criteria.len(),
            "matching engine initialized"
        );

        Ok(MatchingEngine { config, candidates })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Rank the candidate set for a single sample
    pub fn rank_sample(&self, sample: &SoilSample) -> Result<Vec<MatchResult>> {
        rank(sample, self.candidates.as_slice(), &self.config.criteria)
    }

    /// Resolve a sample's cell: keep a pre-resolved token, otherwise encode
    /// its coordinates at the configured resolution. Returns `None` when the
    /// sample carries neither.
    fn resolve_cell(&self, sample: &SoilSample) -> Result<Option<String>> {
        if let Some(cell) = &sample.cell {
            // Token must at least parse; resolution mismatches would silently
            // split the grouping.
            let res = spatial::cell_resolution(cell)?;
            if res != self.config.resolution {
                warn!(
                    sample = %sample.id,
                    cell_resolution = res,
                    configured = self.config.resolution,
                    "pre-resolved cell at a different resolution"
                );
            }
            return Ok(Some(cell.clone()));
        }

        match (sample.lat, sample.lon) {
            (Some(lat), Some(lon)) => {
                Ok(Some(spatial::encode(lat, lon, self.config.resolution)?))
            }
            _ => Ok(None),
        }
    }

    /// Run the full batch: rank, score, derive risk, aggregate.
    ///
    /// Fails with a validation error when the batch suitability maximum is
    /// non-positive (risk would be undefined for every sample). A sample
    /// without cell or coordinates is still scored but excluded from the
    /// per-cell summary.
    pub fn run(&self, samples: &[SoilSample]) -> Result<BatchOutcome> {
        let weights = &self.config.weights;
        let policy = self.config.missing_policy;

        // Fan out: independent per-sample ranking and suitability. A bad
        // coordinate or malformed token invalidates only its own record.
        let scored: Vec<(Vec<MatchResult>, Option<String>, f64)> = samples
            .par_iter()
            .map(|sample| {
                let matches = self.rank_sample(sample)?;
                let cell = match self.resolve_cell(sample) {
                    Ok(cell) => cell,
                    Err(e) => {
                        warn!(sample = %sample.id, error = %e, "cell resolution failed, sample excluded from aggregation");
                        None
                    }
                };
                let suit = suitability(sample, weights, policy);
                Ok((matches, cell, suit))
            })
            .collect::<Result<_>>()?;

        // Fan in: batch maximum, then risk per sample.
        let max_suitability = scored
            .iter()
            .map(|(_, _, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        if samples.is_empty() || max_suitability <= 0.0 {
            return Err(EngineError::validation(format!(
                "non-positive batch suitability maximum: {}",
                if samples.is_empty() {
                    0.0
                } else {
                    max_suitability
                }
            )));
        }

        let mut matches = Vec::new();
        let mut scores = Vec::with_capacity(samples.len());
        for (sample, (ranked, cell, suit)) in samples.iter().zip(scored) {
            if ranked.is_empty() {
                warn!(sample = %sample.id, "no scorable criteria for any candidate");
            }
            matches.extend(ranked);

            let risk = 1.0 - suit / max_suitability;
            scores.push(SampleScore {
                sample_id: sample.id.clone(),
                cell,
                suitability: suit,
                risk,
                risk_level: classify_risk(risk),
            });
        }

        let cells = summarize_cells(&scores);
        info!(
            samples = samples.len(),
            matches = matches.len(),
            cells = cells.len(),
            "batch run complete"
        );

        Ok(BatchOutcome {
            matches,
            scores,
            cells,
        })
    }
}
