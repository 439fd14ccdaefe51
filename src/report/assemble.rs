use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::table::{Cell, Table, STAT_PLACES, TEST_PLACES};
use crate::data::model::{Dimension, NumericField};
use crate::pipeline::Analysis;
use crate::stats::aggregate::GroupSummary;
use crate::stats::descriptive::FieldSummary;
use crate::stats::trend::GroupTrend;
use crate::stats::{ratio, Computed};

pub const SECTION_OVERVIEW: &str = "overview";
pub const SECTION_MISSING: &str = "missing_values";
pub const SECTION_OVERALL_SUMMARY: &str = "overall_summary";
pub const SECTION_OVERALL_TREND: &str = "overall_trend";
pub const SECTION_ROW_TRENDS: &str = "row_trends";
pub const SECTION_CORRELATIONS: &str = "correlations";
pub const SECTION_NORMALITY: &str = "normality";
pub const SECTION_DIAGNOSTICS: &str = "diagnostics";

/// Analysis period covered by the two population snapshots.
pub const ANALYSIS_PERIOD: &str = "2020-2023";

pub fn summary_section(dimension: Dimension) -> String {
    format!("summary_by_{}", dimension.column())
}

pub fn trend_section(dimension: Dimension) -> String {
    format!("trend_by_{}", dimension.column())
}

pub fn share_section(dimension: Dimension) -> String {
    format!("population_2023_share_by_{}", dimension.column())
}

pub fn distribution_section(dimension: Dimension) -> String {
    format!("distribution_by_{}", dimension.column())
}

// ---------------------------------------------------------------------------
// Report – ordered sections of tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub table: Table,
}

/// The structured summary handed to the text and chart writers.
///
/// Serialises as `{"title": …, "sections": {name: table, …}}`, keeping
/// section order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn section(&self, name: &str) -> Option<&Table> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.table)
    }

    fn add(&mut self, name: impl Into<String>, table: Table) {
        self.sections.push(Section {
            name: name.into(),
            table,
        });
    }
}

struct SectionMap<'a>(&'a [Section]);

impl Serialize for SectionMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for section in self.0 {
            map.serialize_entry(&section.name, &section.table)?;
        }
        map.end()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("sections", &SectionMap(&self.sections))?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Lay out an [`Analysis`] as report tables. Only formatting and rounding
/// happen here.
pub fn assemble(analysis: &Analysis, title: &str) -> Report {
    let mut report = Report {
        title: title.to_string(),
        sections: Vec::new(),
    };

    report.add(SECTION_OVERVIEW, overview(analysis));
    report.add(SECTION_MISSING, missing_values(analysis));
    report.add(SECTION_OVERALL_SUMMARY, overall_summary(analysis));

    for (&dim, groups) in &analysis.summaries {
        report.add(summary_section(dim), group_summaries(groups));
    }

    report.add(
        SECTION_OVERALL_TREND,
        group_trend_table(std::slice::from_ref(&analysis.overall_trend)),
    );
    for (&dim, trends) in &analysis.group_trends {
        report.add(trend_section(dim), group_trend_table(trends));
    }
    report.add(SECTION_ROW_TRENDS, row_trends(analysis));

    for (&dim, shares) in &analysis.shares {
        let mut table = Table::new(&["group", "known", "population_2023", "share_pct"]);
        for share in shares {
            table.push(vec![
                Cell::text(&share.key),
                Cell::count(share.known),
                Cell::computed_count(share.total.map(|t| t.round() as u64)),
                Cell::percent(share.share),
            ]);
        }
        report.add(share_section(dim), table);
    }

    for (&dim, counts) in &analysis.distributions {
        let mut table = Table::new(&["category", "records", "share_pct"]);
        for count in counts {
            table.push(vec![
                Cell::text(&count.key),
                Cell::count(count.records),
                Cell::percent(count.share),
            ]);
        }
        report.add(distribution_section(dim), table);
    }

    report.add(SECTION_CORRELATIONS, correlations(analysis));
    report.add(SECTION_NORMALITY, normality(analysis));
    report.add(SECTION_DIAGNOSTICS, diagnostics(analysis));
    report
}

fn overview(analysis: &Analysis) -> Table {
    let mut table = Table::new(&["metric", "value"]);
    table.push(vec![Cell::text("rows_read"), Cell::count(analysis.rows_read)]);
    table.push(vec![Cell::text("observations"), Cell::count(analysis.dataset.len())]);
    table.push(vec![Cell::text("rows_rejected"), Cell::count(analysis.rejected_rows())]);
    table.push(vec![Cell::text("values_flagged"), Cell::count(analysis.flagged_values())]);
    table.push(vec![Cell::text("analysis_period"), Cell::text(ANALYSIS_PERIOD)]);
    table.push(vec![
        Cell::text("significance_level"),
        Cell::decimal(analysis.significance_level, TEST_PLACES),
    ]);
    table
}

fn missing_values(analysis: &Analysis) -> Table {
    let rows = analysis.missing.rows as f64;
    let pct = |n: usize| Cell::percent(ratio(n as f64, rows));

    let mut table = Table::new(&["column", "kind", "count", "pct"]);
    for (field, &n) in &analysis.missing.unknown {
        table.push(vec![Cell::text(field.column()), Cell::text("unknown"), Cell::count(n), pct(n)]);
    }
    for (dim, &n) in &analysis.missing.unrecognized {
        table.push(vec![
            Cell::text(dim.column()),
            Cell::text("unrecognized"),
            Cell::count(n),
            pct(n),
        ]);
    }
    table
}

fn overall_summary(analysis: &Analysis) -> Table {
    let mut table =
        Table::new(&["field", "known", "mean", "median", "std_dev", "min", "max", "cv"]);
    for (&field, summary) in &analysis.overall {
        let mut row = vec![Cell::text(field.column()), Cell::count(summary.known)];
        row.extend(field_stat_cells(field, summary));
        table.push(row);
    }
    table
}

fn group_summaries(groups: &[GroupSummary]) -> Table {
    let mut table = Table::new(&[
        "group", "rows", "field", "known", "mean", "median", "std_dev", "min", "max", "cv",
    ]);
    for group in groups {
        for (&field, summary) in &group.fields {
            let mut row = vec![
                Cell::text(&group.key),
                Cell::count(group.count),
                Cell::text(field.column()),
                Cell::count(summary.known),
            ];
            row.extend(field_stat_cells(field, summary));
            table.push(row);
        }
    }
    table
}

fn field_stat_cells(field: NumericField, summary: &FieldSummary) -> Vec<Cell> {
    let extreme = |v: f64| {
        if field.is_count() {
            Cell::Integer(v as i64)
        } else {
            Cell::decimal(v, STAT_PLACES)
        }
    };
    match summary.stats {
        Computed::Defined(stats) => vec![
            Cell::decimal(stats.mean, STAT_PLACES),
            Cell::decimal(stats.median, STAT_PLACES),
            Cell::computed(stats.std_dev, STAT_PLACES),
            extreme(stats.min),
            extreme(stats.max),
            Cell::computed(stats.cv, STAT_PLACES),
        ],
        Computed::Undefined(reason) => vec![Cell::Undefined(reason); 6],
    }
}

fn group_trend_table(trends: &[GroupTrend]) -> Table {
    let mut table = Table::new(&[
        "group",
        "paired_rows",
        "total_2020",
        "total_2023",
        "change",
        "growth_pct",
    ]);
    for trend in trends {
        table.push(vec![
            Cell::text(&trend.key),
            Cell::count(trend.paired_rows),
            Cell::computed_count(trend.total_2020),
            Cell::computed_count(trend.total_2023),
            Cell::computed_integer(trend.absolute_change),
            Cell::percent(trend.growth),
        ]);
    }
    table
}

fn row_trends(analysis: &Analysis) -> Table {
    let mut table = Table::new(&[
        "row",
        "species",
        "region",
        "population_2020",
        "population_2023",
        "change",
        "growth_pct",
    ]);
    for trend in &analysis.row_trends {
        table.push(vec![
            Cell::count(trend.row),
            Cell::text(trend.species.to_string()),
            Cell::text(&trend.region),
            Cell::known_count(trend.population_2020),
            Cell::known_count(trend.population_2023),
            Cell::computed_integer(trend.absolute_change),
            Cell::percent(trend.growth),
        ]);
    }
    table
}

fn correlations(analysis: &Analysis) -> Table {
    let mut table = Table::new(&["field_a", "field_b", "paired", "r", "p_value", "significant"]);
    for result in &analysis.correlations {
        table.push(vec![
            Cell::text(result.pair.first().column()),
            Cell::text(result.pair.second().column()),
            Cell::count(result.paired),
            Cell::computed(result.coefficient, TEST_PLACES),
            Cell::computed(result.p_value, TEST_PLACES),
            Cell::computed_bool(result.significant),
        ]);
    }
    table
}

fn normality(analysis: &Analysis) -> Table {
    let result = &analysis.normality;
    let mut table = Table::new(&["field", "test", "n", "w", "p_value", "consistent_with_normal"]);
    table.push(vec![
        Cell::text(result.field.column()),
        Cell::text("shapiro_wilk"),
        Cell::count(result.n),
        Cell::computed(result.test.map(|t| t.w), TEST_PLACES),
        Cell::computed(result.test.map(|t| t.p_value), TEST_PLACES),
        Cell::computed_bool(result.consistent_with_normal),
    ]);
    table
}

fn diagnostics(analysis: &Analysis) -> Table {
    let mut table = Table::new(&["row", "severity", "column", "reason"]);
    for issue in &analysis.issues {
        table.push(vec![
            Cell::count(issue.row),
            Cell::text(issue.severity.to_string()),
            Cell::text(issue.column.clone().unwrap_or_default()),
            Cell::text(&issue.reason),
        ]);
    }
    table
}
