use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use log::info;

use crate::data::cleaner::clean;
use crate::data::loader::{load_file, load_reader, LoadedTable};
use crate::data::model::{Dataset, Dimension, NumericField};
use crate::error::{IssueSeverity, LoadError, RowIssue};
use crate::stats::aggregate::{
    distribution, missing_profile, overall_summary, population_share, summarize_all,
    CategoryCount, GroupSummary, MissingProfile, Share,
};
use crate::stats::correlation::{correlation_matrix, CorrelationResult};
use crate::stats::descriptive::FieldSummary;
use crate::stats::normality::{normality, NormalityResult};
use crate::stats::trend::{group_trends, overall_trend, row_trends, GroupTrend, TrendRecord};

/// Dimensions population shares are reported for.
pub const SHARE_DIMENSIONS: [Dimension; 2] = [Dimension::Species, Dimension::Region];

/// Dimensions whose category frequencies are reported.
pub const DISTRIBUTION_DIMENSIONS: [Dimension; 2] =
    [Dimension::HabitatType, Dimension::ConservationStatus];

/// Field tested for normality.
pub const NORMALITY_FIELD: NumericField = NumericField::Population2023;

// ---------------------------------------------------------------------------
// Analysis – everything one run computes
// ---------------------------------------------------------------------------

/// The results of a run, independent of how they are reported.
///
/// Every stage receives the same cleaned [`Dataset`] by shared reference.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub dataset: Dataset,
    /// Loader and cleaner diagnostics, in row order.
    pub issues: Vec<RowIssue>,
    /// Data rows read, including rejected ones.
    pub rows_read: usize,
    pub significance_level: f64,

    pub missing: MissingProfile,
    /// Whole-dataset statistics per numeric field.
    pub overall: BTreeMap<NumericField, FieldSummary>,
    pub summaries: BTreeMap<Dimension, Vec<GroupSummary>>,
    pub shares: BTreeMap<Dimension, Vec<Share>>,
    pub distributions: BTreeMap<Dimension, Vec<CategoryCount>>,

    pub row_trends: Vec<TrendRecord>,
    pub group_trends: BTreeMap<Dimension, Vec<GroupTrend>>,
    pub overall_trend: GroupTrend,

    pub correlations: Vec<CorrelationResult>,
    pub normality: NormalityResult,
}

impl Analysis {
    /// Clean a loaded table and run every statistical stage over it.
    pub fn run(table: LoadedTable, significance_level: f64) -> Self {
        let LoadedTable { rows, mut issues } = table;
        let rejected = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Rejected)
            .count();
        let rows_read = rows.len() + rejected;

        let cleaned = clean(&rows);
        issues.extend(cleaned.issues);
        issues.sort_by_key(|i| (i.row, i.severity));
        let dataset = cleaned.dataset;

        info!("Running analysis over {} observations", dataset.len());

        let summaries = summarize_all(&dataset);
        let shares = SHARE_DIMENSIONS
            .iter()
            .map(|&dim| (dim, population_share(&dataset, dim, NumericField::Population2023)))
            .collect();
        let distributions = DISTRIBUTION_DIMENSIONS
            .iter()
            .map(|&dim| (dim, distribution(&dataset, dim)))
            .collect();
        let group_trends = Dimension::GROUPING
            .iter()
            .map(|&dim| (dim, group_trends(&dataset, dim)))
            .collect();

        Analysis {
            missing: missing_profile(&dataset),
            overall: overall_summary(&dataset),
            summaries,
            shares,
            distributions,
            row_trends: row_trends(&dataset),
            group_trends,
            overall_trend: overall_trend(&dataset),
            correlations: correlation_matrix(&dataset, significance_level),
            normality: normality(&dataset, NORMALITY_FIELD, significance_level),
            dataset,
            issues,
            rows_read,
            significance_level,
        }
    }

    pub fn rejected_rows(&self) -> usize {
        self.count_issues(IssueSeverity::Rejected)
    }

    pub fn flagged_values(&self) -> usize {
        self.count_issues(IssueSeverity::Flagged)
    }

    fn count_issues(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Load, clean and analyse a CSV file.
pub fn analyze_file(path: &Path, significance_level: f64) -> Result<Analysis, LoadError> {
    Ok(Analysis::run(load_file(path)?, significance_level))
}

/// Load, clean and analyse CSV text from any reader.
pub fn analyze_reader<R: Read>(
    reader: R,
    significance_level: f64,
) -> Result<Analysis, LoadError> {
    Ok(Analysis::run(load_reader(reader)?, significance_level))
}
