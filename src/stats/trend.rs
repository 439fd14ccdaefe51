//! Population change between the 2020 and 2023 surveys.
//!
//! Growth is a fraction: `0.2` means +20 %. It is undefined whenever the
//! 2020 base is unknown or zero, or the 2023 count is unknown.

use super::aggregate::group_by;
use super::{Computed, UndefinedReason};
use crate::data::model::{Dataset, Dimension, Observation, Species};

/// Change for one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRecord {
    pub row: usize,
    pub species: Species,
    pub region: String,
    pub population_2020: Option<u64>,
    pub population_2023: Option<u64>,
    pub absolute_change: Computed<i64>,
    pub growth: Computed<f64>,
}

/// Change for a group, from summed populations of its paired rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTrend {
    pub key: String,
    /// Rows where both surveys are known; only these enter the sums.
    pub paired_rows: usize,
    /// Undefined when there are no paired rows or the sum overflows.
    pub total_2020: Computed<u64>,
    pub total_2023: Computed<u64>,
    pub absolute_change: Computed<i64>,
    pub growth: Computed<f64>,
}

/// Label used for the whole-dataset trend.
pub const OVERALL_KEY: &str = "All observations";

/// `(p2023 - p2020) / p2020`, or the reason it cannot be computed.
pub fn growth(population_2020: Option<u64>, population_2023: Option<u64>) -> Computed<f64> {
    match (population_2020, population_2023) {
        (None, _) | (Some(_), None) => Computed::Undefined(UndefinedReason::MissingValue),
        (Some(0), Some(_)) => Computed::Undefined(UndefinedReason::ZeroBase),
        (Some(base), Some(current)) => {
            Computed::Defined((current as f64 - base as f64) / base as f64)
        }
    }
}

fn absolute_change(population_2020: Option<u64>, population_2023: Option<u64>) -> Computed<i64> {
    match (population_2020, population_2023) {
        (Some(base), Some(current)) => {
            match i64::try_from(i128::from(current) - i128::from(base)) {
                Ok(change) => Computed::Defined(change),
                Err(_) => Computed::Undefined(UndefinedReason::Overflow),
            }
        }
        _ => Computed::Undefined(UndefinedReason::MissingValue),
    }
}

/// Per-observation trends, in dataset order.
pub fn row_trends(dataset: &Dataset) -> Vec<TrendRecord> {
    dataset
        .iter()
        .map(|obs| TrendRecord {
            row: obs.row,
            species: obs.species,
            region: obs.region.clone(),
            population_2020: obs.population_2020,
            population_2023: obs.population_2023,
            absolute_change: absolute_change(obs.population_2020, obs.population_2023),
            growth: growth(obs.population_2020, obs.population_2023),
        })
        .collect()
}

/// Summed-ratio trend per group along `dimension`, sorted by key.
///
/// Growth is `Σp2023 / Σp2020 - 1` over paired rows, so large colonies weigh
/// more than small ones.
pub fn group_trends(dataset: &Dataset, dimension: Dimension) -> Vec<GroupTrend> {
    group_by(dataset, dimension)
        .into_iter()
        .map(|(key, rows)| summed_trend(key, rows.into_iter()))
        .collect()
}

/// Summed-ratio trend over the whole dataset.
pub fn overall_trend(dataset: &Dataset) -> GroupTrend {
    summed_trend(OVERALL_KEY, dataset.iter())
}

fn summed_trend<'a>(key: &str, rows: impl Iterator<Item = &'a Observation>) -> GroupTrend {
    let mut paired_rows = 0;
    let mut sums = Some((0u64, 0u64));
    for obs in rows {
        if let (Some(base), Some(current)) = (obs.population_2020, obs.population_2023) {
            paired_rows += 1;
            sums = sums.and_then(|(a, b)| Some((a.checked_add(base)?, b.checked_add(current)?)));
        }
    }

    let (total_2020, total_2023) = match sums {
        _ if paired_rows == 0 => (
            Computed::Undefined(UndefinedReason::NoKnownValues),
            Computed::Undefined(UndefinedReason::NoKnownValues),
        ),
        Some((a, b)) => (Computed::Defined(a), Computed::Defined(b)),
        None => (
            Computed::Undefined(UndefinedReason::Overflow),
            Computed::Undefined(UndefinedReason::Overflow),
        ),
    };

    let (absolute_change, growth) = match (total_2020, total_2023) {
        (Computed::Defined(a), Computed::Defined(b)) => {
            (absolute_change(Some(a), Some(b)), growth(Some(a), Some(b)))
        }
        (Computed::Undefined(reason), _) | (_, Computed::Undefined(reason)) => {
            (Computed::Undefined(reason), Computed::Undefined(reason))
        }
    };

    GroupTrend {
        key: key.to_string(),
        paired_rows,
        total_2020,
        total_2023,
        absolute_change,
        growth,
    }
}
