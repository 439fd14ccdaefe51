//! Shapiro–Wilk test of normality (Royston 1995 approximation).

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use statrs::distribution::{ContinuousCDF, Normal};

use super::{Computed, UndefinedReason};
use crate::data::model::{Dataset, NumericField};

pub const MIN_SAMPLE: usize = 3;
pub const MAX_SAMPLE: usize = 5000;

/// W statistic and its p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalityResult {
    pub field: NumericField,
    /// Known values tested.
    pub n: usize,
    pub test: Computed<ShapiroWilk>,
    /// Whether normality is *not* rejected at the configured level.
    pub consistent_with_normal: Computed<bool>,
}

/// Test the known values of `field` for normality at level `alpha`.
pub fn normality(dataset: &Dataset, field: NumericField, alpha: f64) -> NormalityResult {
    let values = dataset.known_values(field);
    let test = shapiro_wilk(&values);
    NormalityResult {
        field,
        n: values.len(),
        test,
        consistent_with_normal: test.map(|sw| sw.p_value >= alpha),
    }
}

/// Shapiro–Wilk W and p-value for `3 ≤ n ≤ 5000` non-constant values.
pub fn shapiro_wilk(values: &[f64]) -> Computed<ShapiroWilk> {
    let n = values.len();
    if n < MIN_SAMPLE {
        return Computed::Undefined(UndefinedReason::InsufficientSample {
            required: MIN_SAMPLE,
            actual: n,
        });
    }
    if n > MAX_SAMPLE {
        return Computed::Undefined(UndefinedReason::SampleTooLarge {
            limit: MAX_SAMPLE,
            actual: n,
        });
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss == 0.0 {
        return Computed::Undefined(UndefinedReason::ZeroVariance);
    }

    let Ok(std_normal) = Normal::new(0.0, 1.0) else {
        return Computed::Undefined(UndefinedReason::DistributionUnavailable);
    };

    let a = coefficients(n, &std_normal);
    let numerator: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum();
    let w = (numerator * numerator / ss).min(1.0);

    Computed::Defined(ShapiroWilk {
        w,
        p_value: p_value(w, n, &std_normal),
    })
}

/// Evaluate `c[0] + c[1]·u + … + c[5]·u⁵`.
fn poly(c: &[f64], u: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * u + ci)
}

/// Royston's approximation to the Shapiro–Wilk weights.
fn coefficients(n: usize, std_normal: &Normal) -> Vec<f64> {
    if n == 3 {
        return vec![-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2];
    }

    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| std_normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let mm: f64 = m.iter().map(|v| v * v).sum();
    let u = 1.0 / nf.sqrt();

    let a_n = poly(
        &[m[n - 1] / mm.sqrt(), 0.221157, -0.147981, -2.071190, 4.434685, -2.706056],
        u,
    );

    let mut a = vec![0.0; n];
    if n > 5 {
        let a_n1 = poly(
            &[m[n - 2] / mm.sqrt(), 0.042981, -0.293762, -1.752461, 5.682633, -3.582633],
            u,
        );
        let phi = (mm - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * a_n.powi(2) - 2.0 * a_n1.powi(2));
        for i in 2..n - 2 {
            a[i] = m[i] / phi.sqrt();
        }
        a[1] = -a_n1;
        a[n - 2] = a_n1;
    } else {
        let phi = (mm - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n.powi(2));
        for i in 1..n - 1 {
            a[i] = m[i] / phi.sqrt();
        }
    }
    a[0] = -a_n;
    a[n - 1] = a_n;
    a
}

fn p_value(w: f64, n: usize, std_normal: &Normal) -> f64 {
    if w >= 1.0 {
        return 1.0;
    }
    if n == 3 {
        let p = 6.0 / PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let nf = n as f64;
    let y = (1.0 - w).ln();
    let z = if n <= 11 {
        let gamma = 0.459 * nf - 2.273;
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf.powi(2) - 0.0006714 * nf.powi(3);
        let sigma =
            (1.3822 - 0.77857 * nf + 0.062767 * nf.powi(2) - 0.0020322 * nf.powi(3)).exp();
        if gamma - y <= 0.0 {
            return 0.0;
        }
        (-(gamma - y).ln() - mu) / sigma
    } else {
        let ln_n = nf.ln();
        let mu = 0.0038915 * ln_n.powi(3) - 0.083751 * ln_n.powi(2) - 0.31082 * ln_n - 1.5861;
        let sigma = (0.0030302 * ln_n.powi(2) - 0.082676 * ln_n - 0.4803).exp();
        (y - mu) / sigma
    };
    (1.0 - std_normal.cdf(z)).clamp(0.0, 1.0)
}
