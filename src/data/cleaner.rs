use log::{debug, info};

use super::model::{
    ConservationStatus, Dataset, HabitatType, Observation, RawObservation, Species,
    Vocabulary, WaterSalinity, COL_ALTITUDE_METERS, COL_CONSERVATION_STATUS, COL_HABITAT_TYPE,
    COL_POPULATION_2020, COL_POPULATION_2023, COL_SPECIES, COL_TEMPERATURE_CELSIUS,
    COL_WATER_SALINITY, UNRECOGNIZED_LABEL,
};
use crate::error::RowIssue;

/// Cleaner output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cleaned {
    pub dataset: Dataset,
    /// Values that were replaced by an unknown or `Unrecognized` marker.
    pub issues: Vec<RowIssue>,
}

/// Normalise raw rows into a typed [`Dataset`].
///
/// * populations must be finite, non-negative whole numbers, otherwise unknown
/// * altitude and temperature must be finite, otherwise unknown
/// * categorical text is mapped onto its vocabulary; misses become `Unrecognized`
/// * region and country have surrounding and repeated whitespace removed
///
/// Running this over rows rendered from an already-clean dataset returns the
/// same dataset.
pub fn clean(rows: &[RawObservation]) -> Cleaned {
    let mut issues = Vec::new();
    let observations: Vec<Observation> = rows
        .iter()
        .map(|raw| clean_row(raw, &mut issues))
        .collect();

    info!(
        "Cleaned {} observations ({} value(s) replaced)",
        observations.len(),
        issues.len()
    );
    Cleaned {
        dataset: Dataset::from_observations(observations),
        issues,
    }
}

fn clean_row(raw: &RawObservation, issues: &mut Vec<RowIssue>) -> Observation {
    let row = raw.row;
    Observation {
        row,
        species: categorical::<Species>(row, COL_SPECIES, &raw.species, issues),
        region: collapse_whitespace(&raw.region),
        country: collapse_whitespace(&raw.country),
        population_2020: count(row, COL_POPULATION_2020, raw.population_2020, issues),
        population_2023: count(row, COL_POPULATION_2023, raw.population_2023, issues),
        habitat_type: categorical::<HabitatType>(row, COL_HABITAT_TYPE, &raw.habitat_type, issues),
        conservation_status: categorical::<ConservationStatus>(
            row,
            COL_CONSERVATION_STATUS,
            &raw.conservation_status,
            issues,
        ),
        altitude_meters: measurement(row, COL_ALTITUDE_METERS, raw.altitude_meters, issues),
        temperature_celsius: measurement(
            row,
            COL_TEMPERATURE_CELSIUS,
            raw.temperature_celsius,
            issues,
        ),
        water_salinity: categorical::<WaterSalinity>(
            row,
            COL_WATER_SALINITY,
            &raw.water_salinity,
            issues,
        ),
    }
}

fn categorical<V: Vocabulary>(
    row: usize,
    column: &str,
    text: &str,
    issues: &mut Vec<RowIssue>,
) -> V {
    let value = V::normalize(text);
    // Rows rendered from a clean dataset already carry the marker label.
    if !value.is_recognized() && text.trim() != UNRECOGNIZED_LABEL {
        let reason = if text.trim().is_empty() {
            "value is missing; recorded as Unrecognized".to_string()
        } else {
            format!("'{}' is not in the vocabulary; recorded as Unrecognized", text.trim())
        };
        debug!("row {row}: {column}: {reason}");
        issues.push(RowIssue::flagged(row, column, reason));
    }
    value
}

/// Largest head count accepted; every count must also fit an `i64`.
/// `i64::MAX as f64` rounds up to 2^63, so the bound is exclusive.
const POPULATION_LIMIT: f64 = i64::MAX as f64;

fn count(row: usize, column: &str, value: Option<f64>, issues: &mut Vec<RowIssue>) -> Option<u64> {
    let v = value?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < POPULATION_LIMIT {
        return Some(v as u64);
    }
    let reason = if v.is_finite() && v < 0.0 {
        format!("negative population {v}; treated as unknown")
    } else if v.is_finite() && v >= POPULATION_LIMIT {
        format!("population {v} is out of range; treated as unknown")
    } else {
        format!("{v} is not a whole head count; treated as unknown")
    };
    debug!("row {row}: {column}: {reason}");
    issues.push(RowIssue::flagged(row, column, reason));
    None
}

fn measurement(
    row: usize,
    column: &str,
    value: Option<f64>,
    issues: &mut Vec<RowIssue>,
) -> Option<f64> {
    let v = value?;
    if v.is_finite() {
        return Some(v);
    }
    issues.push(RowIssue::flagged(
        row,
        column,
        format!("{v} is not a finite number; treated as unknown"),
    ));
    None
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
