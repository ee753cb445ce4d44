//! Spatial Indexer
//!
//! Pure geometry over the hierarchical hexagonal H3 grid: encode a
//! coordinate to a cell token at a fixed resolution, decode a token to its
//! centroid, and reconstruct a cell's boundary ring. Cell tokens are opaque
//! strings to every consumer except this module.
//!
//! Coarser resolution means larger cells and fewer, more populated groups
//! downstream; `decode(encode(p))` is the cell centroid, equal to `p` only
//! up to cell granularity.

use crate::error::{EngineError, Result};
use h3o::{CellIndex, LatLng, Resolution};

/// Encode a coordinate to a cell token at the given resolution.
///
/// Fails with a validation error when the latitude is outside [-90, 90],
/// the longitude outside [-180, 180], or the resolution outside the grid's
/// supported range.
pub fn encode(lat: f64, lon: f64, resolution: u8) -> Result<String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(EngineError::validation(format!(
            "latitude {} outside [-90, 90]",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(EngineError::validation(format!(
            "longitude {} outside [-180, 180]",
            lon
        )));
    }

    let resolution = parse_resolution(resolution)?;
    let coord = LatLng::new(lat, lon)
        .map_err(|e| EngineError::validation(format!("invalid coordinate: {}", e)))?;

    Ok(coord.to_cell(resolution).to_string())
}

/// Decode a cell token to its centroid (lat, lon)
pub fn decode(cell_id: &str) -> Result<(f64, f64)> {
    let centre = LatLng::from(parse_cell(cell_id)?);
    Ok((centre.lat(), centre.lng()))
}

/// Boundary ring of a cell: hexagon vertices in consistent winding order,
/// closed (first vertex repeated as the last)
pub fn boundary(cell_id: &str) -> Result<Vec<(f64, f64)>> {
    let cell = parse_cell(cell_id)?;
    let mut ring: Vec<(f64, f64)> = cell
        .boundary()
        .iter()
        .map(|v| (v.lat(), v.lng()))
        .collect();

    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    Ok(ring)
}

/// Resolution a cell token was encoded at
pub fn cell_resolution(cell_id: &str) -> Result<u8> {
    Ok(u8::from(parse_cell(cell_id)?.resolution()))
}

fn parse_resolution(resolution: u8) -> Result<Resolution> {
    Resolution::try_from(resolution)
        .map_err(|_| EngineError::validation(format!("invalid grid resolution: {}", resolution)))
}

fn parse_cell(cell_id: &str) -> Result<CellIndex> {
    cell_id
        .parse::<CellIndex>()
        .map_err(|_| EngineError::validation(format!("malformed cell token: '{}'", cell_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Brasília
    const LAT: f64 = -15.79;
    const LON: f64 = -47.88;

    #[test]
    fn test_encode_is_deterministic_and_stable() {
        let a = encode(LAT, LON, 6).unwrap();
        let b = encode(LAT, LON, 6).unwrap();
        assert_eq!(a, b);
        assert_eq!(cell_resolution(&a).unwrap(), 6);
    }

    #[test]
    fn test_encode_rejects_out_of_range_coordinates() {
        assert!(matches!(
            encode(91.0, 0.0, 6),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            encode(0.0, -181.0, 6),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            encode(LAT, LON, 16),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_returns_centroid_within_cell_granularity() {
        // A resolution-6 cell spans a few kilometres; the centroid must sit
        // well within a tenth of a degree of the encoded point.
        let cell = encode(LAT, LON, 6).unwrap();
        let (lat, lon) = decode(&cell).unwrap();
        assert!((lat - LAT).abs() < 0.1, "centroid lat {} too far", lat);
        assert!((lon - LON).abs() < 0.1, "centroid lon {} too far", lon);
    }

    #[test]
    fn test_centroid_reencodes_to_same_cell() {
        let cell = encode(LAT, LON, 6).unwrap();
        let (lat, lon) = decode(&cell).unwrap();
        assert_eq!(encode(lat, lon, 6).unwrap(), cell);
    }

    #[test]
    fn test_boundary_is_closed_hexagon() {
        let cell = encode(LAT, LON, 6).unwrap();
        let ring = boundary(&cell).unwrap();
        // Six vertices plus the repeated first.
        assert_eq!(ring.len(), 7);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_malformed_token_is_validation_error() {
        assert!(matches!(decode("not-a-cell"), Err(EngineError::Validation(_))));
        assert!(matches!(
            boundary("zzzz"),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_coarser_resolution_merges_points() {
        // Two nearby points fall in different fine cells but share a coarse one.
        let fine_a = encode(LAT, LON, 9).unwrap();
        let fine_b = encode(LAT + 0.02, LON, 9).unwrap();
        assert_ne!(fine_a, fine_b);

        let coarse_a = encode(LAT, LON, 3).unwrap();
        let coarse_b = encode(LAT + 0.02, LON, 3).unwrap();
        assert_eq!(coarse_a, coarse_b);
    }
}
