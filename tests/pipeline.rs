use flamingo_analytics::data::model::{Dimension, NumericField, Species};
use flamingo_analytics::error::{IssueSeverity, LoadError};
use flamingo_analytics::pipeline::{analyze_reader, Analysis};
use flamingo_analytics::report::assemble::{
    assemble, share_section, summary_section, trend_section, SECTION_CORRELATIONS,
    SECTION_DIAGNOSTICS, SECTION_OVERALL_SUMMARY, SECTION_OVERVIEW,
};
use flamingo_analytics::report::chart::prepare_charts;
use flamingo_analytics::report::render::render_text;
use flamingo_analytics::report::table::Cell;
use flamingo_analytics::stats::correlation::{correlate, DEFAULT_SIGNIFICANCE_LEVEL};
use flamingo_analytics::stats::{Computed, UndefinedReason};

const HEADER: &str = "species,region,country,population_2020,population_2023,habitat_type,\
conservation_status,altitude_meters,temperature_celsius,water_salinity\n";

fn analyze(body: &str) -> Analysis {
    let text = format!("{HEADER}{body}");
    analyze_reader(text.as_bytes(), DEFAULT_SIGNIFICANCE_LEVEL).unwrap()
}

#[test]
fn single_lesser_flamingo_grows_twenty_percent() {
    let analysis =
        analyze("Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1750,24,Saline\n");

    assert_eq!(analysis.row_trends.len(), 1);
    assert_eq!(analysis.row_trends[0].species, Species::Lesser);
    let growth = analysis.row_trends[0].growth.defined().unwrap();
    assert!((growth - 0.20).abs() < 1e-12);

    let report = assemble(&analysis, "Test");
    let trends = report.section(&trend_section(Dimension::Species)).unwrap();
    assert_eq!(
        trends.lookup("Lesser Flamingo", "growth_pct"),
        Some(&Cell::Decimal { value: 20.0, places: 2 })
    );
}

#[test]
fn zero_base_population_has_undefined_growth() {
    let analysis = analyze("Andean Flamingo,Andes,Bolivia,0,50,Salt Lake,VU,4300,3,Hypersaline\n");

    assert_eq!(
        analysis.row_trends[0].growth,
        Computed::Undefined(UndefinedReason::ZeroBase)
    );
    assert_eq!(
        analysis.overall_trend.growth,
        Computed::Undefined(UndefinedReason::ZeroBase)
    );

    let report = assemble(&analysis, "Test");
    let json = serde_json::to_value(&report).unwrap();
    let cell = &json["sections"]["row_trends"]["rows"][0][6];
    assert_eq!(cell["undefined"], "zero base");
    assert!(!render_text(&report).contains("inf"));
}

#[test]
fn group_with_only_unknown_base_has_undefined_statistics() {
    let analysis = analyze(
        "Andean Flamingo,Andes,Chile,,11600,Salt Pan,VU,3900,5.2,Hypersaline\n\
         Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1750,24,Saline\n",
    );

    let species = &analysis.summaries[&Dimension::Species];
    let andean = species.iter().find(|g| g.key == "Andean Flamingo").unwrap();
    assert_eq!(andean.count, 1);
    let p2020 = andean.field(NumericField::Population2020).unwrap();
    assert_eq!(p2020.known, 0);
    assert!(!p2020.stats.is_defined());

    let p2023 = andean.field(NumericField::Population2023).unwrap();
    assert_eq!(p2023.known, 1);
    assert_eq!(p2023.stats.defined().unwrap().mean, 11600.0);
}

#[test]
fn two_paired_rows_leave_correlation_undefined() {
    let analysis = analyze(
        "Andean Flamingo,Andes,Chile,10,12,Salt Pan,VU,3900,5.2,Hypersaline\n\
         Andean Flamingo,Andes,Bolivia,20,22,Salt Lake,VU,4300,3.1,Hypersaline\n\
         Andean Flamingo,Andes,Peru,30,31,Salt Lake,VU,,4.0,Hypersaline\n",
    );

    let result = correlate(
        &analysis.dataset,
        NumericField::AltitudeMeters,
        NumericField::TemperatureCelsius,
        DEFAULT_SIGNIFICANCE_LEVEL,
    );
    assert_eq!(result.paired, 2);
    assert!(matches!(
        result.coefficient,
        Computed::Undefined(UndefinedReason::InsufficientSample { required: 3, actual: 2 })
    ));
    assert!(!result.significant.is_defined());

    let report = assemble(&analysis, "Test");
    let table = report.section(SECTION_CORRELATIONS).unwrap();
    assert_eq!(table.len(), 6);
}

#[test]
fn group_counts_sum_to_dataset_length() {
    let analysis = analyze(include_str!("../data/flamingo_data.csv").split_once('\n').unwrap().1);

    for dim in Dimension::GROUPING {
        let total: usize = analysis.summaries[&dim].iter().map(|g| g.count).sum();
        assert_eq!(total, analysis.dataset.len(), "{dim}");
    }
}

#[test]
fn bundled_sample_runs_end_to_end() {
    let analysis = analyze_reader(
        include_str!("../data/flamingo_data.csv").as_bytes(),
        DEFAULT_SIGNIFICANCE_LEVEL,
    )
    .unwrap();

    // The row without a region is the only rejection.
    assert_eq!(analysis.rows_read, 19);
    assert_eq!(analysis.rejected_rows(), 1);
    assert_eq!(analysis.dataset.len(), 18);

    // Aliases fold onto canonical labels.
    let species = &analysis.summaries[&Dimension::Species];
    let james = species.iter().find(|g| g.key == "James's Flamingo").unwrap();
    assert_eq!(james.count, 2);

    // Negative head count and unknown habitat are flagged, not dropped.
    assert!(analysis
        .issues
        .iter()
        .any(|i| i.severity == IssueSeverity::Flagged && i.reason.contains("negative")));
    assert!(analysis
        .issues
        .iter()
        .any(|i| i.reason.contains("Rocky Shore")));

    let report = assemble(&analysis, "Flamingo report");
    let overview = report.section(SECTION_OVERVIEW).unwrap();
    assert_eq!(overview.lookup("observations", "value"), Some(&Cell::Integer(18)));
    assert!(!report.section(SECTION_DIAGNOSTICS).unwrap().is_empty());
    assert!(report.section(&summary_section(Dimension::Region)).is_some());

    let text = render_text(&report);
    assert!(text.starts_with(&"=".repeat(70)));
    assert!(text.contains("FLAMINGO REPORT"));

    let charts = prepare_charts(&analysis);
    assert_eq!(charts.len(), 2);
    assert_eq!(charts[0].bars.len(), 6);
    let largest = charts[0].bars.last().unwrap();
    assert_eq!(largest.label, "Lesser Flamingo");
}

#[test]
fn correlation_is_symmetric_on_the_sample() {
    let analysis = analyze_reader(
        include_str!("../data/flamingo_data.csv").as_bytes(),
        DEFAULT_SIGNIFICANCE_LEVEL,
    )
    .unwrap();
    let ab = correlate(
        &analysis.dataset,
        NumericField::AltitudeMeters,
        NumericField::TemperatureCelsius,
        DEFAULT_SIGNIFICANCE_LEVEL,
    );
    let ba = correlate(
        &analysis.dataset,
        NumericField::TemperatureCelsius,
        NumericField::AltitudeMeters,
        DEFAULT_SIGNIFICANCE_LEVEL,
    );
    assert_eq!(ab, ba);
    // Cold sites are the high ones.
    assert!(ab.coefficient.defined().unwrap() < -0.5);
}

#[test]
fn missing_required_column_fails_the_run() {
    let text = "species,region,country\nLesser Flamingo,East Africa,Kenya\n";
    let err = analyze_reader(text.as_bytes(), DEFAULT_SIGNIFICANCE_LEVEL).unwrap_err();
    match err {
        LoadError::MissingColumns(cols) => {
            assert!(cols.contains(&"population_2020".to_string()));
            assert!(cols.contains(&"water_salinity".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn oversized_population_is_flagged_instead_of_overflowing() {
    let analysis = analyze(
        "Greater Flamingo,Mediterranean,Spain,9223372036854775808,1,Salt Pan,LC,2,17,Saline\n\
         Greater Flamingo,Mediterranean,France,100,110,Salt Pan,LC,1,15,Saline\n",
    );

    assert_eq!(analysis.dataset.len(), 2);
    assert_eq!(analysis.dataset.observations[0].population_2020, None);
    assert_eq!(
        analysis.row_trends[0].absolute_change,
        Computed::Undefined(UndefinedReason::MissingValue)
    );
    assert!(analysis
        .issues
        .iter()
        .any(|i| i.row == 0 && i.reason.contains("out of range")));
    assert_eq!(analysis.overall_trend.total_2020, Computed::Defined(100));

    let text = render_text(&assemble(&analysis, "Test"));
    assert!(!text.contains("-9223372036854775808"));
}

#[test]
fn undecodable_row_is_rejected_without_losing_the_rest() {
    let mut bytes = HEADER.as_bytes().to_vec();
    let rows: [&[u8]; 2] = [
        b"Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1750,24,Saline\n",
        b"Andean Flamingo,\xffAndes,Chile,10,12,Salt Pan,VU,3900,5,Hypersaline\n",
    ];
    for row in rows {
        bytes.extend_from_slice(row);
    }

    let analysis = analyze_reader(bytes.as_slice(), DEFAULT_SIGNIFICANCE_LEVEL).unwrap();
    assert_eq!(analysis.rows_read, 2);
    assert_eq!(analysis.rejected_rows(), 1);
    assert_eq!(analysis.dataset.len(), 1);
    assert_eq!(analysis.dataset.observations[0].species, Species::Lesser);
}

#[test]
fn group_without_known_populations_is_undefined_not_zero() {
    let analysis = analyze(
        "Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1750,24,Saline\n\
         Andean Flamingo,Andes,Chile,,,Salt Pan,VU,3900,5.2,Hypersaline\n",
    );
    let undefined = Cell::Undefined(UndefinedReason::NoKnownValues);
    let report = assemble(&analysis, "Test");

    let shares = report.section(&share_section(Dimension::Species)).unwrap();
    assert_eq!(shares.lookup("Andean Flamingo", "population_2023"), Some(&undefined));
    assert_eq!(shares.lookup("Andean Flamingo", "share_pct"), Some(&undefined));
    assert_eq!(
        shares.lookup("Lesser Flamingo", "share_pct"),
        Some(&Cell::Decimal { value: 100.0, places: 2 })
    );

    let trends = report.section(&trend_section(Dimension::Species)).unwrap();
    assert_eq!(trends.lookup("Andean Flamingo", "total_2020"), Some(&undefined));
    assert_eq!(trends.lookup("Andean Flamingo", "total_2023"), Some(&undefined));

    let charts = prepare_charts(&analysis);
    let andean = charts[0]
        .bars
        .iter()
        .find(|b| b.label == "Andean Flamingo")
        .unwrap();
    assert_eq!(andean.value, None);
}

#[test]
fn overall_summary_reports_every_numeric_field() {
    let analysis = analyze(
        "Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1750,24,Saline\n\
         Andean Flamingo,Andes,Chile,,11600,Salt Pan,VU,3900,5.2,Hypersaline\n",
    );
    let report = assemble(&analysis, "Test");
    let overall = report.section(SECTION_OVERALL_SUMMARY).unwrap();

    assert_eq!(overall.len(), 4);
    assert_eq!(overall.lookup("population_2023", "known"), Some(&Cell::Integer(2)));
    assert_eq!(
        overall.lookup("population_2023", "mean"),
        Some(&Cell::Decimal { value: 5860.0, places: 2 })
    );
    assert_eq!(overall.lookup("population_2023", "min"), Some(&Cell::Integer(120)));
    assert_eq!(overall.lookup("population_2023", "max"), Some(&Cell::Integer(11600)));
    assert_eq!(overall.lookup("population_2020", "known"), Some(&Cell::Integer(1)));
    assert_eq!(
        overall.lookup("population_2020", "std_dev"),
        Some(&Cell::Undefined(UndefinedReason::InsufficientSample { required: 2, actual: 1 }))
    );
}
