//! Pairwise Pearson correlation between numeric fields.
//!
//! Each pair uses only the rows where both fields are known. Significance is
//! always the two-sided Pearson t-test,
//! `t = r·√((n−2)/(1−r²))` with `n−2` degrees of freedom, whatever `n` is.

use log::warn;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::descriptive::mean;
use super::{Computed, UndefinedReason};
use crate::data::model::{Dataset, NumericField};

/// Fewest paired observations a coefficient is reported for.
pub const MIN_PAIRED_OBSERVATIONS: usize = 3;

/// Significance level used when the configuration does not set one.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

// ---------------------------------------------------------------------------
// FieldPair – unordered pair of fields
// ---------------------------------------------------------------------------

/// An unordered pair; `FieldPair::new(a, b) == FieldPair::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPair {
    first: NumericField,
    second: NumericField,
}

impl FieldPair {
    pub fn new(a: NumericField, b: NumericField) -> Self {
        if a <= b {
            FieldPair { first: a, second: b }
        } else {
            FieldPair { first: b, second: a }
        }
    }

    pub fn first(self) -> NumericField {
        self.first
    }

    pub fn second(self) -> NumericField {
        self.second
    }

    /// Every pair of distinct fields, each once.
    pub fn all() -> Vec<FieldPair> {
        let fields = NumericField::ALL;
        let mut pairs = Vec::new();
        for (i, &a) in fields.iter().enumerate() {
            for &b in &fields[i + 1..] {
                pairs.push(FieldPair::new(a, b));
            }
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// CorrelationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub pair: FieldPair,
    /// Rows where both fields are known.
    pub paired: usize,
    /// Pearson r in [-1, 1].
    pub coefficient: Computed<f64>,
    /// Two-sided p-value of the t-test.
    pub p_value: Computed<f64>,
    /// `p_value < alpha`.
    pub significant: Computed<bool>,
}

/// Correlate two fields over pairwise-complete rows.
pub fn correlate(
    dataset: &Dataset,
    a: NumericField,
    b: NumericField,
    alpha: f64,
) -> CorrelationResult {
    let pair = FieldPair::new(a, b);
    let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
        .iter()
        .filter_map(|obs| Some((pair.first.value(obs)?, pair.second.value(obs)?)))
        .unzip();

    let paired = xs.len();
    let coefficient = pearson(&xs, &ys);
    let p_value = coefficient.and_then(|r| t_test_p_value(r, paired));
    let significant = p_value.map(|p| p < alpha);

    CorrelationResult {
        pair,
        paired,
        coefficient,
        p_value,
        significant,
    }
}

/// Results for every pair of numeric fields.
pub fn correlation_matrix(dataset: &Dataset, alpha: f64) -> Vec<CorrelationResult> {
    FieldPair::all()
        .into_iter()
        .map(|pair| correlate(dataset, pair.first, pair.second, alpha))
        .collect()
}

/// Pearson's r for equal-length samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Computed<f64> {
    let n = xs.len().min(ys.len());
    if n < MIN_PAIRED_OBSERVATIONS {
        return Computed::Undefined(UndefinedReason::InsufficientSample {
            required: MIN_PAIRED_OBSERVATIONS,
            actual: n,
        });
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let (Some(mx), Some(my)) = (mean(xs).defined(), mean(ys).defined()) else {
        return Computed::Undefined(UndefinedReason::NoKnownValues);
    };

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Computed::Undefined(UndefinedReason::ZeroVariance);
    }
    Computed::Defined((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Two-sided p-value for H0: ρ = 0 given r from `n` pairs.
pub fn t_test_p_value(r: f64, n: usize) -> Computed<f64> {
    if n < MIN_PAIRED_OBSERVATIONS {
        return Computed::Undefined(UndefinedReason::InsufficientSample {
            required: MIN_PAIRED_OBSERVATIONS,
            actual: n,
        });
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        // |r| = 1: the statistic is unbounded.
        return Computed::Defined(0.0);
    }
    let t = r * (df / denom).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => Computed::Defined((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0)),
        Err(e) => {
            warn!("t-distribution with {df} degrees of freedom unavailable: {e}");
            Computed::Undefined(UndefinedReason::DistributionUnavailable)
        }
    }
}
