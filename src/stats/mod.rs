//! Statistical stages. Every function here is a pure function of a borrowed
//! [`Dataset`](crate::data::model::Dataset).
//!
//! ```text
//!                 ┌────────────┐
//!            ┌───▶│ aggregate  │  grouped summaries, shares, distributions
//!            │    └────────────┘
//!  Dataset ──┼───▶┌────────────┐
//!            │    │   trend    │  2020 → 2023 growth, per row and per group
//!            │    └────────────┘
//!            └───▶┌────────────┐
//!                 │ correlation│  Pearson r + t-test, Shapiro–Wilk
//!                 └────────────┘
//! ```
use std::fmt;

pub mod aggregate;
pub mod correlation;
pub mod descriptive;
pub mod normality;
pub mod trend;

// ---------------------------------------------------------------------------
// Computed – a value or an explicit "could not be computed"
// ---------------------------------------------------------------------------

/// Why a statistic has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// An input the formula needs is unknown.
    MissingValue,
    /// The denominator (base population, total) is zero.
    ZeroBase,
    /// No known values were available at all.
    NoKnownValues,
    InsufficientSample { required: usize, actual: usize },
    SampleTooLarge { limit: usize, actual: usize },
    /// One of the inputs is constant.
    ZeroVariance,
    /// A ratio to the mean was requested and the mean is zero.
    ZeroMean,
    /// The reference distribution could not be built for these parameters.
    DistributionUnavailable,
    /// The exact result does not fit the integer type it is reported in.
    Overflow,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::MissingValue => write!(f, "missing value"),
            UndefinedReason::ZeroBase => write!(f, "zero base"),
            UndefinedReason::NoKnownValues => write!(f, "no known values"),
            UndefinedReason::InsufficientSample { required, actual } => {
                write!(f, "need at least {required} observations, got {actual}")
            }
            UndefinedReason::SampleTooLarge { limit, actual } => {
                write!(f, "at most {limit} observations supported, got {actual}")
            }
            UndefinedReason::ZeroVariance => write!(f, "zero variance"),
            UndefinedReason::ZeroMean => write!(f, "zero mean"),
            UndefinedReason::DistributionUnavailable => write!(f, "distribution unavailable"),
            UndefinedReason::Overflow => write!(f, "overflow"),
        }
    }
}

/// The result of a computation that may legitimately have no value.
///
/// Undefined is never folded into 0, NaN or infinity; callers have to match
/// on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Computed<T> {
    Defined(T),
    Undefined(UndefinedReason),
}

impl<T> Computed<T> {
    pub fn from_option(value: Option<T>, reason: UndefinedReason) -> Self {
        match value {
            Some(v) => Computed::Defined(v),
            None => Computed::Undefined(reason),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Computed::Defined(_))
    }

    pub fn defined(self) -> Option<T> {
        match self {
            Computed::Defined(v) => Some(v),
            Computed::Undefined(_) => None,
        }
    }

    pub fn as_ref(&self) -> Computed<&T> {
        match self {
            Computed::Defined(v) => Computed::Defined(v),
            Computed::Undefined(r) => Computed::Undefined(*r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Computed::Defined(v) => Computed::Defined(f(v)),
            Computed::Undefined(r) => Computed::Undefined(r),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Computed<U>) -> Computed<U> {
        match self {
            Computed::Defined(v) => f(v),
            Computed::Undefined(r) => Computed::Undefined(r),
        }
    }
}

/// `numerator / denominator`, undefined when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Computed<f64> {
    if denominator == 0.0 {
        Computed::Undefined(UndefinedReason::ZeroBase)
    } else {
        Computed::Defined(numerator / denominator)
    }
}
