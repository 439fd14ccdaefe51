use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::stats::{Computed, UndefinedReason};

// ---------------------------------------------------------------------------
// Rounding policy
// ---------------------------------------------------------------------------

/// Decimal places for percentages (growth, shares, frequencies).
pub const PERCENT_PLACES: u8 = 2;
/// Decimal places for means, medians, deviations, real-valued extremes, CV.
pub const STAT_PLACES: u8 = 2;
/// Decimal places for correlation coefficients, p-values and W.
pub const TEST_PLACES: u8 = 4;

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u8) -> f64 {
    let scale = 10f64.powi(i32::from(places));
    (value * scale).round() / scale
}

// ---------------------------------------------------------------------------
// Cell – a single value in a report table
// ---------------------------------------------------------------------------

/// A report cell. Numbers are rounded when the cell is built, so every
/// consumer sees the same value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    /// Already rounded to `places` decimals.
    Decimal { value: f64, places: u8 },
    Bool(bool),
    Undefined(UndefinedReason),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn count(n: usize) -> Self {
        Self::integer(n as u64)
    }

    /// An integer cell, or `Undefined(Overflow)` if it does not fit an `i64`.
    pub fn integer(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(v) => Cell::Integer(v),
            Err(_) => Cell::Undefined(UndefinedReason::Overflow),
        }
    }

    pub fn decimal(value: f64, places: u8) -> Self {
        Cell::Decimal {
            value: round_to(value, places),
            places,
        }
    }

    /// A fraction rendered as a percentage: `0.2` becomes `20.00`.
    pub fn percent(fraction: Computed<f64>) -> Self {
        Self::computed(fraction.map(|f| f * 100.0), PERCENT_PLACES)
    }

    pub fn computed(value: Computed<f64>, places: u8) -> Self {
        match value {
            Computed::Defined(v) => Self::decimal(v, places),
            Computed::Undefined(reason) => Cell::Undefined(reason),
        }
    }

    pub fn computed_integer(value: Computed<i64>) -> Self {
        match value {
            Computed::Defined(v) => Cell::Integer(v),
            Computed::Undefined(reason) => Cell::Undefined(reason),
        }
    }

    pub fn computed_count(value: Computed<u64>) -> Self {
        match value {
            Computed::Defined(v) => Self::integer(v),
            Computed::Undefined(reason) => Cell::Undefined(reason),
        }
    }

    pub fn computed_bool(value: Computed<bool>) -> Self {
        match value {
            Computed::Defined(b) => Cell::Bool(b),
            Computed::Undefined(reason) => Cell::Undefined(reason),
        }
    }

    /// An optional count, where `None` means the input was unknown.
    pub fn known_count(value: Option<u64>) -> Self {
        match value {
            Some(v) => Self::integer(v),
            None => Cell::Undefined(UndefinedReason::MissingValue),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Cell::Undefined(_))
    }

    /// Numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Decimal { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Decimal { value, places } => write!(f, "{value:.*}", usize::from(*places)),
            Cell::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            Cell::Undefined(_) => write!(f, "undefined"),
        }
    }
}

/// Text and numbers serialise as themselves; an undefined cell becomes
/// `{"undefined": "<reason>"}` so it can never be read as a number.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Decimal { value, .. } => serializer.serialize_f64(*value),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Undefined(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("undefined", &reason.to_string())?;
                map.end()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Table – a named grid of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one cell per column.
    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cell in `column` of the first row whose first cell reads `key`.
    pub fn lookup(&self, key: &str, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| matches!(row.first(), Some(Cell::Text(k)) if k == key))
            .and_then(|row| row.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_two_places() {
        let cell = Cell::percent(Computed::Defined(0.123456));
        assert_eq!(cell, Cell::Decimal { value: 12.35, places: 2 });
        assert_eq!(cell.to_string(), "12.35");
        assert_eq!(Cell::percent(Computed::Defined(0.2)).to_string(), "20.00");
    }

    #[test]
    fn undefined_is_never_a_number() {
        let cell = Cell::percent(Computed::Undefined(UndefinedReason::ZeroBase));
        assert!(cell.is_undefined());
        assert_eq!(cell.as_f64(), None);
        assert_eq!(cell.to_string(), "undefined");
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, r#"{"undefined":"zero base"}"#);
    }

    #[test]
    fn decimals_keep_their_precision_in_text() {
        assert_eq!(Cell::decimal(0.5, TEST_PLACES).to_string(), "0.5000");
        assert_eq!(Cell::decimal(-1.005, STAT_PLACES).as_f64(), Some(round_to(-1.005, 2)));
    }

    #[test]
    fn counts_beyond_i64_are_undefined_not_negative() {
        assert_eq!(Cell::integer(42), Cell::Integer(42));
        assert_eq!(Cell::integer(i64::MAX as u64), Cell::Integer(i64::MAX));
        assert_eq!(Cell::integer(u64::MAX), Cell::Undefined(UndefinedReason::Overflow));
        assert_eq!(
            Cell::computed_count(Computed::Undefined(UndefinedReason::NoKnownValues)),
            Cell::Undefined(UndefinedReason::NoKnownValues)
        );
        assert_eq!(Cell::known_count(Some(7)), Cell::Integer(7));
    }

    #[test]
    fn lookup_finds_by_first_column() {
        let mut table = Table::new(&["group", "rows"]);
        table.push(vec![Cell::text("Andes"), Cell::count(3)]);
        table.push(vec![Cell::text("Caribbean"), Cell::count(5)]);
        assert_eq!(table.lookup("Caribbean", "rows"), Some(&Cell::Integer(5)));
        assert_eq!(table.lookup("Caribbean", "missing"), None);
        assert_eq!(table.lookup("Nowhere", "rows"), None);
    }
}
