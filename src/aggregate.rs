//! Aggregation Engine
//!
//! Rolls per-sample scores up to per-cell statistics. Two surfaces:
//! DataFrame-shaped operations (group-by-cell mean, weighted sum, inner-join
//! merge) for tabular pipelines, and a typed `summarize_cells` roll-up
//! producing the external `cell_id -> {mean_suitability, mean_risk,
//! sample_count}` shape.
//!
//! Grouping and join order never affect output content, only row order.

use crate::error::Result;
use crate::pipeline::SampleScore;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

/// Per-cell summary, present only once at least one sample landed in the cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellSummary {
    pub mean_suitability: f64,
    pub mean_risk: f64,
    pub sample_count: usize,
}

/// Group records by cell id and take the mean of each value field.
///
/// Documented no-op: when `cell_id_field` is absent from the frame entirely,
/// the input is returned unchanged rather than erroring. Rows with a null
/// cell id are skipped; value fields absent from the frame are skipped with
/// a warning.
pub fn aggregate_by_cell(
    df: &DataFrame,
    cell_id_field: &str,
    value_fields: &[&str],
) -> Result<DataFrame> {
    if df.column(cell_id_field).is_err() {
        warn!(
            field = cell_id_field,
            "cell id field missing, skipping aggregation"
        );
        return Ok(df.clone());
    }

    let mut aggs = Vec::with_capacity(value_fields.len());
    for &field in value_fields {
        if df.column(field).is_ok() {
            aggs.push(col(field).mean().alias(field));
        } else {
            warn!(field, "value field missing, excluded from aggregation");
        }
    }

    let out = df
        .clone()
        .lazy()
        .filter(col(cell_id_field).is_not_null())
        .group_by([col(cell_id_field)])
        .agg(aggs)
        .collect()?;

    Ok(out)
}

/// Group records by cell id and take the weighted sum of each value field.
///
/// Each value field named in `weights` is multiplied by its weight before
/// summing; fields not in the mapping are summed unweighted. The no-op and
/// skip rules of `aggregate_by_cell` apply.
pub fn weighted_aggregate(
    df: &DataFrame,
    value_fields: &[&str],
    weights: &FxHashMap<String, f64>,
    cell_id_field: &str,
) -> Result<DataFrame> {
    if df.column(cell_id_field).is_err() {
        warn!(
            field = cell_id_field,
            "cell id field missing, skipping weighted aggregation"
        );
        return Ok(df.clone());
    }

    let mut aggs = Vec::with_capacity(value_fields.len());
    for &field in value_fields {
        if df.column(field).is_err() {
            warn!(field, "value field missing, excluded from aggregation");
            continue;
        }
        let expr = match weights.get(field) {
            Some(&w) => (col(field) * lit(w)).sum().alias(field),
            None => col(field).sum().alias(field),
        };
        aggs.push(expr);
    }

    let out = df
        .clone()
        .lazy()
        .filter(col(cell_id_field).is_not_null())
        .group_by([col(cell_id_field)])
        .agg(aggs)
        .collect()?;

    Ok(out)
}

/// Inner-join two aggregates on cell id.
///
/// Cells present in only one side are dropped; callers needing outer-join
/// semantics must pre-fill missing cells.
pub fn merge_aggregates(a: &DataFrame, b: &DataFrame, cell_id_field: &str) -> Result<DataFrame> {
    let out = a
        .clone()
        .lazy()
        .inner_join(b.clone().lazy(), col(cell_id_field), col(cell_id_field))
        .collect()?;

    Ok(out)
}

/// Typed roll-up: mean suitability, mean risk, and sample count per cell.
///
/// Scores without a resolved cell are skipped, not errors.
pub fn summarize_cells(scores: &[SampleScore]) -> FxHashMap<String, CellSummary> {
    let mut sums: FxHashMap<String, (f64, f64, usize)> = FxHashMap::default();

    for score in scores {
        let Some(cell) = &score.cell else {
            warn!(sample = %score.sample_id, "no resolved cell, excluded from summary");
            continue;
        };
        let entry = sums.entry(cell.clone()).or_insert((0.0, 0.0, 0));
        entry.0 += score.suitability;
        entry.1 += score.risk;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(cell, (suit, risk, n))| {
            (
                cell,
                CellSummary {
                    mean_suitability: suit / n as f64,
                    mean_risk: risk / n as f64,
                    sample_count: n,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::suitability::RiskLevel;
    use approx::assert_relative_eq;

    fn scored_frame() -> DataFrame {
        df!(
            "cell" => ["a", "a", "b", "b", "b"],
            "suitability" => [0.2, 0.6, 1.0, 2.0, 3.0],
            "risk" => [0.8, 0.4, 0.5, 0.3, 0.1],
        )
        .unwrap()
    }

    fn cell_value(df: &DataFrame, cell: &str, field: &str) -> f64 {
        let cells = df.column("cell").unwrap().str().unwrap();
        let values = df.column(field).unwrap().f64().unwrap();
        for i in 0..df.height() {
            if cells.get(i) == Some(cell) {
                return values.get(i).unwrap();
            }
        }
        panic!("cell '{}' not in aggregate", cell);
    }

    #[test]
    fn test_aggregate_by_cell_means() {
        let out = aggregate_by_cell(&scored_frame(), "cell", &["suitability", "risk"]).unwrap();
        assert_eq!(out.height(), 2);
        assert_relative_eq!(cell_value(&out, "a", "suitability"), 0.4, epsilon = 1e-9);
        assert_relative_eq!(cell_value(&out, "b", "suitability"), 2.0, epsilon = 1e-9);
        assert_relative_eq!(cell_value(&out, "a", "risk"), 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_cell_field_is_noop() {
        let input = df!("x" => [1.0, 2.0]).unwrap();
        let out = aggregate_by_cell(&input, "cell", &["x"]).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_null_cell_rows_are_skipped() {
        let input = df!(
            "cell" => [Some("a"), None, Some("a")],
            "suitability" => [1.0, 100.0, 3.0],
        )
        .unwrap();
        let out = aggregate_by_cell(&input, "cell", &["suitability"]).unwrap();
        assert_eq!(out.height(), 1);
        assert_relative_eq!(cell_value(&out, "a", "suitability"), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aggregation_is_idempotent_on_aggregated_input() {
        let once = aggregate_by_cell(&scored_frame(), "cell", &["suitability", "risk"]).unwrap();
        let twice = aggregate_by_cell(&once, "cell", &["suitability", "risk"]).unwrap();
        assert_eq!(twice.height(), once.height());
        for cell in ["a", "b"] {
            assert_relative_eq!(
                cell_value(&twice, cell, "suitability"),
                cell_value(&once, cell, "suitability"),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_weighted_aggregate_applies_mapped_weights_only() {
        let weights: FxHashMap<String, f64> =
            [("suitability".to_string(), 0.5)].into_iter().collect();
        let out =
            weighted_aggregate(&scored_frame(), &["suitability", "risk"], &weights, "cell")
                .unwrap();

        // Weighted sum for "a": 0.5 * (0.2 + 0.6); unweighted sum for risk.
        assert_relative_eq!(cell_value(&out, "a", "suitability"), 0.4, epsilon = 1e-9);
        assert_relative_eq!(cell_value(&out, "a", "risk"), 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_aggregates_inner_join_drops_one_sided_cells() {
        let a = df!("cell" => ["a", "b"], "suitability" => [0.4, 2.0]).unwrap();
        let b = df!("cell" => ["b", "c"], "risk" => [0.3, 0.9]).unwrap();

        let merged = merge_aggregates(&a, &b, "cell").unwrap();
        assert_eq!(merged.height(), 1);
        assert_relative_eq!(cell_value(&merged, "b", "suitability"), 2.0, epsilon = 1e-9);
        assert_relative_eq!(cell_value(&merged, "b", "risk"), 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_summarize_cells() {
        let scores = vec![
            SampleScore {
                sample_id: "s1".to_string(),
                cell: Some("a".to_string()),
                suitability: 0.2,
                risk: 0.8,
                risk_level: RiskLevel::High,
            },
            SampleScore {
                sample_id: "s2".to_string(),
                cell: Some("a".to_string()),
                suitability: 0.6,
                risk: 0.0,
                risk_level: RiskLevel::Low,
            },
            SampleScore {
                sample_id: "s3".to_string(),
                cell: None,
                suitability: 9.0,
                risk: 9.0,
                risk_level: RiskLevel::High,
            },
        ];

        let cells = summarize_cells(&scores);
        assert_eq!(cells.len(), 1);
        let summary = &cells["a"];
        assert_relative_eq!(summary.mean_suitability, 0.4, epsilon = 1e-9);
        assert_relative_eq!(summary.mean_risk, 0.4, epsilon = 1e-9);
        assert_eq!(summary.sample_count, 2);
    }
}
