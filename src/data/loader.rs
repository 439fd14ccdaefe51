use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{debug, info, warn};

use super::model::{
    RawObservation, COL_ALTITUDE_METERS, COL_POPULATION_2020, COL_POPULATION_2023,
    COL_TEMPERATURE_CELSIUS, REQUIRED_COLUMNS,
};
use crate::error::{LoadError, RowIssue};

/// Cell text that means "no value recorded" rather than a parse failure.
const MISSING_TOKENS: [&str; 8] = ["", "na", "n/a", "nan", "null", "none", "unknown", "-"];

/// Loader output: every row that passed validation plus the diagnostics.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub rows: Vec<RawObservation>,
    pub issues: Vec<RowIssue>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the survey table from a CSV file.
pub fn load_file(path: &Path) -> Result<LoadedTable, LoadError> {
    info!("Loading flamingo population data from {}", path.display());
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(file)
}

/// Load the survey table from any reader yielding comma-separated UTF-8.
///
/// Rows missing species or region, or with the wrong number of fields, are
/// rejected and recorded. Numeric cells that do not parse become unknown and
/// are flagged; the row is kept.
pub fn load_reader<R: Read>(reader: R) -> Result<LoadedTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::MissingHeader);
    }
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut table = LoadedTable::default();

    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            // The reader has already moved past an undecodable row.
            Err(err) if matches!(err.kind(), csv::ErrorKind::Utf8 { .. }) => {
                let issue = RowIssue::rejected(row, None, "row is not valid UTF-8");
                warn!("{issue}");
                table.issues.push(issue);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if record.len() != headers.len() {
            let issue = RowIssue::rejected(
                row,
                None,
                format!("expected {} fields, found {}", headers.len(), record.len()),
            );
            warn!("{issue}");
            table.issues.push(issue);
            continue;
        }

        match columns.parse_row(row, &record, &mut table.issues) {
            Some(raw) => table.rows.push(raw),
            None => {
                if let Some(issue) = table.issues.last() {
                    warn!("{issue}");
                }
            }
        }
    }

    info!(
        "Loaded {} records ({} issue(s) recorded)",
        table.rows.len(),
        table.issues.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

/// Position of every required column within the header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    species: usize,
    region: usize,
    country: usize,
    population_2020: usize,
    population_2023: usize,
    habitat_type: usize,
    conservation_status: usize,
    altitude_meters: usize,
    temperature_celsius: usize,
    water_salinity: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim_start_matches('\u{feff}').trim() == *name)
            })
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let p: Vec<usize> = positions.into_iter().flatten().collect();
        Ok(ColumnIndex {
            species: p[0],
            region: p[1],
            country: p[2],
            population_2020: p[3],
            population_2023: p[4],
            habitat_type: p[5],
            conservation_status: p[6],
            altitude_meters: p[7],
            temperature_celsius: p[8],
            water_salinity: p[9],
        })
    }

    /// Build a raw observation, or push a rejection and return `None`.
    fn parse_row(
        &self,
        row: usize,
        record: &StringRecord,
        issues: &mut Vec<RowIssue>,
    ) -> Option<RawObservation> {
        let text = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let species = text(self.species);
        if species.is_empty() {
            issues.push(RowIssue::rejected(row, Some("species"), "species is missing"));
            return None;
        }
        let region = text(self.region);
        if region.is_empty() {
            issues.push(RowIssue::rejected(row, Some("region"), "region is missing"));
            return None;
        }

        let mut number = |idx: usize, column: &str| {
            parse_number(record.get(idx).unwrap_or(""), row, column, issues)
        };
        let population_2020 = number(self.population_2020, COL_POPULATION_2020);
        let population_2023 = number(self.population_2023, COL_POPULATION_2023);
        let altitude_meters = number(self.altitude_meters, COL_ALTITUDE_METERS);
        let temperature_celsius = number(self.temperature_celsius, COL_TEMPERATURE_CELSIUS);

        Some(RawObservation {
            row,
            species,
            region,
            country: text(self.country),
            population_2020,
            population_2023,
            habitat_type: text(self.habitat_type),
            conservation_status: text(self.conservation_status),
            altitude_meters,
            temperature_celsius,
            water_salinity: text(self.water_salinity),
        })
    }
}

fn is_missing_token(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&lower.as_str())
}

fn parse_number(s: &str, row: usize, column: &str, issues: &mut Vec<RowIssue>) -> Option<f64> {
    if is_missing_token(s) {
        return None;
    }
    match s.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!("row {row}: '{s}' in {column} is not a number");
            issues.push(RowIssue::flagged(
                row,
                column,
                format!("'{s}' is not a number; treated as unknown"),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueSeverity;

    const HEADER: &str = "species,region,country,population_2020,population_2023,\
habitat_type,conservation_status,altitude_meters,temperature_celsius,water_salinity\n";

    fn load(body: &str) -> Result<LoadedTable, LoadError> {
        load_reader(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_a_complete_row() {
        let table = load(
            "Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,Near Threatened,1759,24.5,Saline\n",
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.issues.is_empty());
        let row = &table.rows[0];
        assert_eq!(row.species, "Lesser Flamingo");
        assert_eq!(row.population_2020, Some(100.0));
        assert_eq!(row.temperature_celsius, Some(24.5));
        assert_eq!(row.water_salinity, "Saline");
    }

    #[test]
    fn rejects_rows_without_species_or_region() {
        let table = load(
            ",East Africa,Kenya,100,120,Soda Lake,LC,1,1,Saline\n\
             Lesser Flamingo,,Kenya,100,120,Soda Lake,LC,1,1,Saline\n\
             Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,LC,1,1,Saline\n",
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].row, 2);
        assert_eq!(table.issues.len(), 2);
        assert!(table
            .issues
            .iter()
            .all(|i| i.severity == IssueSeverity::Rejected));
        assert_eq!(table.issues[0].row, 0);
        assert_eq!(table.issues[1].column.as_deref(), Some("region"));
    }

    #[test]
    fn unparsable_numbers_become_unknown_and_are_flagged() {
        let table = load(
            "Andean Flamingo,Andes,Bolivia,lots,NA,Salt Pan,Vulnerable,,n/a,Hypersaline\n",
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.population_2020, None);
        assert_eq!(row.population_2023, None);
        assert_eq!(row.altitude_meters, None);
        assert_eq!(row.temperature_celsius, None);
        // Only the garbage cell is flagged; missing tokens are silent.
        assert_eq!(table.issues.len(), 1);
        assert_eq!(table.issues[0].severity, IssueSeverity::Flagged);
        assert_eq!(table.issues[0].column.as_deref(), Some(COL_POPULATION_2020));
    }

    #[test]
    fn short_rows_are_rejected() {
        let table = load("Lesser Flamingo,East Africa\n").unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.issues.len(), 1);
        assert!(table.issues[0].reason.contains("expected 10 fields"));
    }

    #[test]
    fn undecodable_rows_are_rejected_and_loading_continues() {
        let mut bytes = HEADER.as_bytes().to_vec();
        let rows: [&[u8]; 3] = [
            b"Lesser Flamingo,East Africa,Kenya,100,120,Soda Lake,NT,1,24,Saline\n",
            b"Andean Flamingo,And\xffes,Chile,10,12,Salt Pan,VU,3900,5,Saline\n",
            b"Greater Flamingo,Camargue,France,50,60,Salt Pan,LC,2,17,Saline\n",
        ];
        for row in rows {
            bytes.extend_from_slice(row);
        }

        let table = load_reader(bytes.as_slice()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row, 0);
        assert_eq!(table.rows[1].row, 2);
        assert_eq!(table.issues.len(), 1);
        assert_eq!(table.issues[0].row, 1);
        assert_eq!(table.issues[0].severity, IssueSeverity::Rejected);
        assert!(table.issues[0].reason.contains("UTF-8"));
    }

    #[test]
    fn missing_columns_are_fatal_and_listed() {
        let err = load_reader("species,region\nLesser Flamingo,East Africa\n".as_bytes())
            .unwrap_err();
        match err {
            LoadError::MissingColumns(cols) => {
                assert_eq!(cols.len(), 8);
                assert!(cols.contains(&"population_2023".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = load_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));
    }

    #[test]
    fn columns_may_appear_in_any_order() {
        let csv = "region,species,water_salinity,country,population_2023,population_2020,\
habitat_type,conservation_status,temperature_celsius,altitude_meters,notes\n\
Caribbean,American Flamingo,Saline,Bahamas,600,500,Coastal Lagoon,LC,28,2,seen\n";
        let table = load_reader(csv.as_bytes()).unwrap();
        let row = &table.rows[0];
        assert_eq!(row.species, "American Flamingo");
        assert_eq!(row.population_2020, Some(500.0));
        assert_eq!(row.population_2023, Some(600.0));
        assert_eq!(row.altitude_meters, Some(2.0));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
