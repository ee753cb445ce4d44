//! Error Taxonomy
//!
//! Core errors surfaced to callers. Data gaps are deliberately NOT errors:
//! a missing field is skipped and reported through breakdown entries or
//! `tracing::warn`, never by aborting a batch.

use thiserror::Error;

/// Errors produced by the matching and aggregation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input: out-of-range coordinates, empty candidate list,
    /// non-positive normalization denominator, invalid configuration.
    /// Never silently corrected.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced cell, sample, or candidate identifier is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// DataFrame-level failure inside an aggregation operation
    #[error("data error: {0}")]
    Data(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }
}
