use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::assemble::Report;
use super::chart::ChartSpec;
use super::table::Table;

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_TEXT: &str = "analysis_report.txt";
pub const CHARTS_JSON: &str = "charts.json";

const RULE_WIDTH: usize = 70;

// ---------------------------------------------------------------------------
// Plain-text rendering
// ---------------------------------------------------------------------------

/// Render the report as fixed-width text tables.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "{}", report.title.to_uppercase());
    let _ = writeln!(out, "{heavy}");

    for section in &report.sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", section.name.to_uppercase().replace('_', " "));
        let _ = writeln!(out, "{light}");
        if section.table.is_empty() {
            let _ = writeln!(out, "(none)");
        } else {
            out.push_str(&render_table(&section.table));
        }
    }
    out
}

fn render_table(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|s| s.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", pad_row(table.columns.iter().map(String::as_str), &widths));
    for row in &cells {
        let _ = writeln!(out, "{}", pad_row(row.iter().map(String::as_str), &widths));
    }
    out
}

fn pad_row<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, &w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

// ---------------------------------------------------------------------------
// Output files
// ---------------------------------------------------------------------------

/// Write `report.json`, `analysis_report.txt` and, if given, `charts.json`
/// into `dir`, creating it when needed. Returns the paths written.
pub fn write_outputs(
    dir: &Path,
    report: &Report,
    charts: Option<&[ChartSpec]>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut written = Vec::new();

    let json = serde_json::to_string_pretty(report).context("serialising report")?;
    written.push(write_file(&dir.join(REPORT_JSON), &json)?);

    written.push(write_file(&dir.join(REPORT_TEXT), &render_text(report))?);

    if let Some(charts) = charts {
        let json = serde_json::to_string_pretty(charts).context("serialising chart data")?;
        written.push(write_file(&dir.join(CHARTS_JSON), &json)?);
    }

    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!("Saved: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assemble::Section;
    use crate::report::table::Cell;
    use crate::stats::UndefinedReason;

    fn report() -> Report {
        let mut table = Table::new(&["group", "growth_pct"]);
        table.push(vec![Cell::text("Lesser Flamingo"), Cell::decimal(20.0, 2)]);
        table.push(vec![
            Cell::text("Andean Flamingo"),
            Cell::Undefined(UndefinedReason::ZeroBase),
        ]);
        Report {
            title: "Test Report".to_string(),
            sections: vec![
                Section {
                    name: "trend_by_species".to_string(),
                    table,
                },
                Section {
                    name: "diagnostics".to_string(),
                    table: Table::new(&["row", "reason"]),
                },
            ],
        }
    }

    #[test]
    fn text_report_aligns_columns_and_marks_undefined() {
        let text = render_text(&report());
        assert!(text.contains("TEST REPORT"));
        assert!(text.contains("TREND BY SPECIES"));
        assert!(text.contains("group            growth_pct"));
        assert!(text.contains("Lesser Flamingo  20.00"));
        assert!(text.contains("Andean Flamingo  undefined"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn json_report_keeps_section_order() {
        // Insertion order is the reverse of alphabetical order here.
        let json = serde_json::to_string_pretty(&report()).unwrap();
        let trend = json.find("\"trend_by_species\"").unwrap();
        let diagnostics = json.find("\"diagnostics\"").unwrap();
        assert!(trend < diagnostics, "sections reordered:\n{json}");
        assert!(json.find("\"title\"").unwrap() < json.find("\"sections\"").unwrap());

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sections"]["trend_by_species"]["rows"][0][1], 20.0);
        assert_eq!(
            value["sections"]["trend_by_species"]["rows"][1][1]["undefined"],
            "zero base"
        );
    }

    #[test]
    fn writes_all_files() {
        let dir = std::env::temp_dir().join(format!("flamingo-render-{}", std::process::id()));
        let charts: Vec<ChartSpec> = Vec::new();
        let written = write_outputs(&dir, &report(), Some(charts.as_slice())).unwrap();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(path.exists());
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
