use std::collections::BTreeMap;

use log::debug;

use super::descriptive::{describe, FieldSummary};
use super::{ratio, Computed, UndefinedReason};
use crate::data::model::{Dataset, Dimension, NumericField, Observation, UNRECOGNIZED_LABEL};

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Partition observations by their normalised label along `dimension`.
/// Keys compare by exact string equality; the map iterates in key order.
pub fn group_by<'a>(
    dataset: &'a Dataset,
    dimension: Dimension,
) -> BTreeMap<&'a str, Vec<&'a Observation>> {
    let mut groups: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in dataset {
        groups.entry(dimension.key(obs)).or_default().push(obs);
    }
    groups
}

// ---------------------------------------------------------------------------
// GroupSummary
// ---------------------------------------------------------------------------

/// Descriptive statistics of every numeric field for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub dimension: Dimension,
    pub key: String,
    /// Rows in the group, regardless of which fields are known.
    pub count: usize,
    pub fields: BTreeMap<NumericField, FieldSummary>,
}

impl GroupSummary {
    pub fn field(&self, field: NumericField) -> Option<&FieldSummary> {
        self.fields.get(&field)
    }
}

/// One [`GroupSummary`] per distinct key, sorted by key.
///
/// Unknown values of a field are left out of that field's statistics only.
pub fn summarize(dataset: &Dataset, dimension: Dimension) -> Vec<GroupSummary> {
    let summaries: Vec<GroupSummary> = group_by(dataset, dimension)
        .into_iter()
        .map(|(key, rows)| {
            let fields = NumericField::ALL
                .iter()
                .map(|&field| {
                    let values: Vec<f64> = rows.iter().filter_map(|obs| field.value(obs)).collect();
                    (field, describe(&values))
                })
                .collect();
            GroupSummary {
                dimension,
                key: key.to_string(),
                count: rows.len(),
                fields,
            }
        })
        .collect();
    debug!("{} {dimension} group(s) summarised", summaries.len());
    summaries
}

/// Statistics of every numeric field over the whole dataset.
pub fn overall_summary(dataset: &Dataset) -> BTreeMap<NumericField, FieldSummary> {
    NumericField::ALL
        .iter()
        .map(|&field| (field, describe(&dataset.known_values(field))))
        .collect()
}

/// Summaries for every grouping dimension.
pub fn summarize_all(dataset: &Dataset) -> BTreeMap<Dimension, Vec<GroupSummary>> {
    Dimension::GROUPING
        .iter()
        .map(|&dim| (dim, summarize(dataset, dim)))
        .collect()
}

// ---------------------------------------------------------------------------
// Shares and categorical distributions
// ---------------------------------------------------------------------------

/// A group's part of a field's grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub key: String,
    /// Rows contributing a known value.
    pub known: usize,
    /// Sum of the known values; undefined when there are none.
    pub total: Computed<f64>,
    /// Fraction of the grand total (0..=1).
    pub share: Computed<f64>,
}

/// Sum of known `field` values per group and its fraction of the grand total,
/// largest first. Groups without known values sort last.
pub fn population_share(
    dataset: &Dataset,
    dimension: Dimension,
    field: NumericField,
) -> Vec<Share> {
    let totals: Vec<(String, usize, Computed<f64>)> = group_by(dataset, dimension)
        .into_iter()
        .map(|(key, rows)| {
            let known: Vec<f64> = rows.iter().filter_map(|obs| field.value(obs)).collect();
            let total = if known.is_empty() {
                Computed::Undefined(UndefinedReason::NoKnownValues)
            } else {
                Computed::Defined(known.iter().sum())
            };
            (key.to_string(), known.len(), total)
        })
        .collect();
    let grand_total: f64 = totals.iter().filter_map(|(_, _, t)| t.defined()).sum();

    let mut shares: Vec<Share> = totals
        .into_iter()
        .map(|(key, known, total)| Share {
            key,
            known,
            total,
            share: total.and_then(|t| ratio(t, grand_total)),
        })
        .collect();
    shares.sort_by(|a, b| {
        let a_total = a.total.defined().unwrap_or(f64::NEG_INFINITY);
        let b_total = b.total.defined().unwrap_or(f64::NEG_INFINITY);
        b_total.total_cmp(&a_total).then_with(|| a.key.cmp(&b.key))
    });
    shares
}

/// How many rows carry each label.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub key: String,
    pub records: usize,
    /// Fraction of all rows.
    pub share: Computed<f64>,
}

/// Row counts per label along `dimension`, most frequent first.
pub fn distribution(dataset: &Dataset, dimension: Dimension) -> Vec<CategoryCount> {
    let rows = dataset.len() as f64;
    let mut counts: Vec<CategoryCount> = group_by(dataset, dimension)
        .into_iter()
        .map(|(key, members)| CategoryCount {
            key: key.to_string(),
            records: members.len(),
            share: ratio(members.len() as f64, rows),
        })
        .collect();
    counts.sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.key.cmp(&b.key)));
    counts
}

// ---------------------------------------------------------------------------
// Missing-value profile
// ---------------------------------------------------------------------------

/// Categorical columns that can hold an `Unrecognized` or empty value.
const CATEGORICAL: [Dimension; 5] = [
    Dimension::Species,
    Dimension::Country,
    Dimension::HabitatType,
    Dimension::ConservationStatus,
    Dimension::WaterSalinity,
];

#[derive(Debug, Clone, PartialEq)]
pub struct MissingProfile {
    pub rows: usize,
    /// Unknown values per numeric field.
    pub unknown: BTreeMap<NumericField, usize>,
    /// Empty or `Unrecognized` values per categorical field.
    pub unrecognized: BTreeMap<Dimension, usize>,
}

pub fn missing_profile(dataset: &Dataset) -> MissingProfile {
    let unknown = NumericField::ALL
        .iter()
        .map(|&field| {
            let n = dataset.iter().filter(|obs| field.value(obs).is_none()).count();
            (field, n)
        })
        .collect();
    let unrecognized = CATEGORICAL
        .iter()
        .map(|&dim| {
            let n = dataset
                .iter()
                .filter(|obs| {
                    let key = dim.key(obs);
                    key.is_empty() || key == UNRECOGNIZED_LABEL
                })
                .count();
            (dim, n)
        })
        .collect();
    MissingProfile {
        rows: dataset.len(),
        unknown,
        unrecognized,
    }
}
