use super::{Computed, UndefinedReason};

/// Descriptive statistics over the known values of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n − 1); needs two known values.
    pub std_dev: Computed<f64>,
    /// Coefficient of variation, `std_dev / mean`. Used as the population
    /// stability index.
    pub cv: Computed<f64>,
}

/// Statistics for one field within one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSummary {
    /// Number of known values (the denominator of the mean).
    pub known: usize,
    pub stats: Computed<FieldStats>,
}

/// Summarise `values`, which must already exclude unknowns.
pub fn describe(values: &[f64]) -> FieldSummary {
    let known = values.len();
    if known == 0 {
        return FieldSummary {
            known,
            stats: Computed::Undefined(UndefinedReason::NoKnownValues),
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().sum::<f64>() / known as f64;
    let std_dev = sample_std_dev(&sorted, mean);
    let cv = std_dev.and_then(|sd| {
        if mean == 0.0 {
            Computed::Undefined(UndefinedReason::ZeroMean)
        } else {
            Computed::Defined(sd / mean)
        }
    });

    FieldSummary {
        known,
        stats: Computed::Defined(FieldStats {
            mean,
            median: median_of_sorted(&sorted),
            min: sorted[0],
            max: sorted[known - 1],
            std_dev,
            cv,
        }),
    }
}

pub fn mean(values: &[f64]) -> Computed<f64> {
    if values.is_empty() {
        return Computed::Undefined(UndefinedReason::NoKnownValues);
    }
    Computed::Defined(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std_dev(values: &[f64], mean: f64) -> Computed<f64> {
    let n = values.len();
    if n < 2 {
        return Computed::Undefined(UndefinedReason::InsufficientSample {
            required: 2,
            actual: n,
        });
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Computed::Defined((ss / (n - 1) as f64).sqrt())
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
