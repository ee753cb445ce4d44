//! Canonical Input Records
//!
//! Soil samples and biochar candidates in the canonical post-normalization
//! schema. Every property is `Option` so that "missing" is a first-class
//! state, distinct from zero. Records are read-only inputs for the duration
//! of a scoring run; derived results hold only their identifiers.

use crate::error::{EngineError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Numeric soil properties addressable by scoring criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilProperty {
    Ph,
    Soc,
    Moisture,
    Ec,
    Temperature,
}

/// Numeric biochar candidate fields addressable by scoring criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateField {
    FixedCarbon,
    VolatileMatter,
    Ash,
    Moisture,
    CPct,
    HPct,
    OPct,
    OCRatio,
    Ph,
    Bet,
    PoreVolume,
    Density,
    ProductionTemp,
}

/// One soil sample, identified either by a sample id or a pre-resolved cell id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoilSample {
    pub id: String,

    /// Geographic position; optional when the sample is already resolved
    /// to a cell
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Pre-resolved hexagonal cell token (opaque outside the spatial indexer)
    pub cell: Option<String>,

    pub ph: Option<f64>,
    /// Soil organic carbon (%)
    pub soc: Option<f64>,
    /// Moisture (%)
    pub moisture: Option<f64>,
    /// Electrical conductivity (dS/m)
    pub ec: Option<f64>,
    /// Temperature (°C)
    pub temperature: Option<f64>,
    /// Texture class, e.g. "sandy loam"
    pub texture: Option<String>,
}

impl SoilSample {
    pub fn new(id: impl Into<String>) -> Self {
        SoilSample {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Numeric property lookup used by the threshold scorer
    pub fn property(&self, prop: SoilProperty) -> Option<f64> {
        match prop {
            SoilProperty::Ph => self.ph,
            SoilProperty::Soc => self.soc,
            SoilProperty::Moisture => self.moisture,
            SoilProperty::Ec => self.ec,
            SoilProperty::Temperature => self.temperature,
        }
    }
}

/// One biochar candidate material in canonical schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiocharCandidate {
    pub id: String,
    pub name: String,
    pub feedstock: Option<String>,

    /// Fixed carbon (%)
    pub fixed_carbon: Option<f64>,
    /// Volatile matter (%)
    pub volatile_matter: Option<f64>,
    /// Ash content (%)
    pub ash: Option<f64>,
    /// Moisture (%)
    pub moisture: Option<f64>,
    pub c_pct: Option<f64>,
    pub h_pct: Option<f64>,
    pub o_pct: Option<f64>,
    pub o_c_ratio: Option<f64>,
    pub ph: Option<f64>,
    /// BET surface area (m²/g)
    pub bet: Option<f64>,
    /// Pore volume (cm³/g)
    pub pore_volume: Option<f64>,
    /// Bulk density (g/cm³)
    pub density: Option<f64>,
    /// Production (pyrolysis) temperature (°C)
    pub production_temp: Option<f64>,
}

impl BiocharCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        BiocharCandidate {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Numeric field lookup used by window criteria
    pub fn field(&self, field: CandidateField) -> Option<f64> {
        match field {
            CandidateField::FixedCarbon => self.fixed_carbon,
            CandidateField::VolatileMatter => self.volatile_matter,
            CandidateField::Ash => self.ash,
            CandidateField::Moisture => self.moisture,
            CandidateField::CPct => self.c_pct,
            CandidateField::HPct => self.h_pct,
            CandidateField::OPct => self.o_pct,
            CandidateField::OCRatio => self.o_c_ratio,
            CandidateField::Ph => self.ph,
            CandidateField::Bet => self.bet,
            CandidateField::PoreVolume => self.pore_volume,
            CandidateField::Density => self.density,
            CandidateField::ProductionTemp => self.production_temp,
        }
    }
}

/// Id-indexed candidate collection
///
/// Insertion order is preserved; ranking ties are broken on candidate id,
/// so the stored order never affects output content.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<BiocharCandidate>,
    index: FxHashMap<String, usize>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<BiocharCandidate>) -> Self {
        let index = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        CandidateSet { candidates, index }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiocharCandidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[BiocharCandidate] {
        &self.candidates
    }

    /// Lookup by candidate id
    pub fn get(&self, id: &str) -> Result<&BiocharCandidate> {
        self.index
            .get(id)
            .map(|&i| &self.candidates[i])
            .ok_or_else(|| EngineError::not_found(format!("candidate '{}'", id)))
    }
}
