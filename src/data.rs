//! Dataset Loading
//!
//! CSV loaders producing canonical candidate and sample records via Polars.
//! Raw headers are mapped through a declarative table (exact match after
//! trimming and lower-casing); unmapped columns are reported, never guessed.

use crate::records::{BiocharCandidate, CandidateSet, SoilSample};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Raw header -> canonical candidate field
const CANDIDATE_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("feedstock", "feedstock"),
    ("fixed carbon", "fixed_carbon"),
    ("fixed_carbon", "fixed_carbon"),
    ("volatile matter", "volatile_matter"),
    ("volatile_matter", "volatile_matter"),
    ("ash", "ash"),
    ("moisture", "moisture"),
    ("c", "c_pct"),
    ("c%", "c_pct"),
    ("c_pct", "c_pct"),
    ("h", "h_pct"),
    ("h%", "h_pct"),
    ("h_pct", "h_pct"),
    ("o", "o_pct"),
    ("o%", "o_pct"),
    ("o_pct", "o_pct"),
    ("o/c", "o_c_ratio"),
    ("o_c_ratio", "o_c_ratio"),
    ("ph", "ph"),
    ("bet", "bet"),
    ("surface area", "bet"),
    ("pore volume", "pore_volume"),
    ("pore_volume", "pore_volume"),
    ("density", "density"),
    ("production temp", "production_temp"),
    ("production_temp", "production_temp"),
    ("final temperature", "production_temp"),
];

/// Raw header -> canonical soil sample field
const SAMPLE_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("sample id", "id"),
    ("ph", "ph"),
    ("soc", "soc"),
    ("soil organic carbon", "soc"),
    ("organic_carbon", "soc"),
    ("organic carbon", "soc"),
    ("moisture", "moisture"),
    ("ec", "ec"),
    ("electrical conductivity", "ec"),
    ("temp", "temperature"),
    ("temperature", "temperature"),
    ("texture", "texture"),
    ("lat", "lat"),
    ("latitude", "lat"),
    ("lon", "lon"),
    ("longitude", "lon"),
    ("cell", "cell"),
    ("cell_id", "cell"),
    ("h3_index", "cell"),
];

/// Load biochar candidates from a CSV in raw or canonical schema.
///
/// Rows without an id get their row index; missing names fall back to the
/// feedstock, then the id.
pub fn load_candidates(path: &Path) -> Result<CandidateSet> {
    let df = read_csv(path)?;
    let df = normalize_columns(df, CANDIDATE_COLUMNS);

    let mut candidates = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let id = string_at(&df, "id", i).unwrap_or_else(|| i.to_string());
        let feedstock = string_at(&df, "feedstock", i);
        let name = string_at(&df, "name", i)
            .or_else(|| feedstock.clone())
            .unwrap_or_else(|| id.clone());

        candidates.push(BiocharCandidate {
            id,
            name,
            feedstock,
            fixed_carbon: float_at(&df, "fixed_carbon", i),
            volatile_matter: float_at(&df, "volatile_matter", i),
            ash: float_at(&df, "ash", i),
            moisture: float_at(&df, "moisture", i),
            c_pct: float_at(&df, "c_pct", i),
            h_pct: float_at(&df, "h_pct", i),
            o_pct: float_at(&df, "o_pct", i),
            o_c_ratio: float_at(&df, "o_c_ratio", i),
            ph: float_at(&df, "ph", i),
            bet: float_at(&df, "bet", i),
            pore_volume: float_at(&df, "pore_volume", i),
            density: float_at(&df, "density", i),
            production_temp: float_at(&df, "production_temp", i),
        });
    }

    info!(candidates = candidates.len(), path = %path.display(), "loaded candidate dataset");
    Ok(CandidateSet::new(candidates))
}

/// Load soil samples from a CSV in raw or canonical schema
pub fn load_samples(path: &Path) -> Result<Vec<SoilSample>> {
    let df = read_csv(path)?;
    let df = normalize_columns(df, SAMPLE_COLUMNS);

    let mut samples = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        samples.push(SoilSample {
            id: string_at(&df, "id", i).unwrap_or_else(|| i.to_string()),
            lat: float_at(&df, "lat", i),
            lon: float_at(&df, "lon", i),
            cell: string_at(&df, "cell", i),
            ph: float_at(&df, "ph", i),
            soc: float_at(&df, "soc", i),
            moisture: float_at(&df, "moisture", i),
            ec: float_at(&df, "ec", i),
            temperature: float_at(&df, "temperature", i),
            texture: string_at(&df, "texture", i),
        });
    }

    info!(samples = samples.len(), path = %path.display(), "loaded sample dataset");
    Ok(samples)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

/// Rename raw headers to canonical names via the mapping table.
///
/// Matching is exact on the trimmed, lower-cased header. Columns with no
/// mapping entry are reported and left untouched; they are simply ignored
/// by the record builders.
fn normalize_columns(mut df: DataFrame, table: &[(&str, &str)]) -> DataFrame {
    let raw_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    for raw in raw_names {
        let key = raw.trim().to_lowercase();
        match table.iter().find(|(from, _)| *from == key) {
            Some((_, canonical)) => {
                if raw != *canonical {
                    // Renaming onto itself is a polars duplicate-name error.
                    let _ = df.rename(&raw, (*canonical).into());
                }
            }
            None => warn!(column = %raw, "unmapped column, ignored"),
        }
    }

    df
}

fn float_at(df: &DataFrame, name: &str, idx: usize) -> Option<f64> {
    let casted = df.column(name).ok()?.cast(&DataType::Float64).ok()?;
    casted.f64().ok()?.get(idx)
}

fn string_at(df: &DataFrame, name: &str, idx: usize) -> Option<String> {
    df.column(name)
        .ok()?
        .str()
        .ok()?
        .get(idx)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_candidates_maps_raw_headers() {
        let path = write_temp(
            "biochar_candidates_raw.csv",
            "ID,Feedstock,Fixed Carbon,pH,Surface Area\n\
             A,eucalyptus,72.5,7.1,310.0\n\
             B,rice husk,48.0,6.2,\n",
        );

        let set = load_candidates(&path).unwrap();
        assert_eq!(set.len(), 2);

        let a = set.get("A").unwrap();
        assert_eq!(a.feedstock.as_deref(), Some("eucalyptus"));
        assert_eq!(a.fixed_carbon, Some(72.5));
        assert_eq!(a.ph, Some(7.1));
        assert_eq!(a.bet, Some(310.0));
        // Name falls back to feedstock.
        assert_eq!(a.name, "eucalyptus");

        let b = set.get("B").unwrap();
        assert_eq!(b.bet, None);
    }

    #[test]
    fn test_load_candidates_generates_missing_ids() {
        let path = write_temp(
            "biochar_candidates_noid.csv",
            "Feedstock,pH\nstraw,6.8\nmanure,7.4\n",
        );

        let set = load_candidates(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("0").unwrap().feedstock.as_deref(), Some("straw"));
        assert_eq!(set.get("1").unwrap().ph, Some(7.4));
    }

    #[test]
    fn test_load_samples_with_coordinates_and_gaps() {
        let path = write_temp(
            "biochar_samples.csv",
            "Sample ID,Latitude,Longitude,pH,Organic Carbon,Moisture,Texture\n\
             s1,-15.79,-47.88,5.8,2.4,53.0,sandy loam\n\
             s2,-16.10,-48.02,,1.1,40.0,\n",
        );

        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, "s1");
        assert_eq!(samples[0].lat, Some(-15.79));
        assert_eq!(samples[0].soc, Some(2.4));
        assert_eq!(samples[0].texture.as_deref(), Some("sandy loam"));

        // Gaps stay gaps, not zeros.
        assert_eq!(samples[1].ph, None);
        assert_eq!(samples[1].texture, None);
    }

    #[test]
    fn test_load_samples_with_preresolved_cells() {
        let path = write_temp(
            "biochar_samples_cells.csv",
            "id,h3_index,pH\ns1,86a8100dfffffff,6.0\n",
        );

        let samples = load_samples(&path).unwrap();
        assert_eq!(samples[0].cell.as_deref(), Some("86a8100dfffffff"));
        assert_eq!(samples[0].lat, None);
    }
}
