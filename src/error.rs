use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// LoadError – fatal, aborts the run
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read input file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("input has no header row")]
    MissingHeader,

    #[error("input is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// RowIssue – recoverable, recorded in diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The row was left out of the dataset.
    Rejected,
    /// The row was kept but one value was replaced by an unknown marker.
    Flagged,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Rejected => write!(f, "rejected"),
            IssueSeverity::Flagged => write!(f, "flagged"),
        }
    }
}

/// A problem with one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// Zero-based data row index.
    pub row: usize,
    pub severity: IssueSeverity,
    /// Column the issue concerns, if it is about a single cell.
    pub column: Option<String>,
    pub reason: String,
}

impl RowIssue {
    pub fn rejected(row: usize, column: Option<&str>, reason: impl Into<String>) -> Self {
        RowIssue {
            row,
            severity: IssueSeverity::Rejected,
            column: column.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub fn flagged(row: usize, column: &str, reason: impl Into<String>) -> Self {
        RowIssue {
            row,
            severity: IssueSeverity::Flagged,
            column: Some(column.to_string()),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(col) => write!(f, "row {} ({}): {col}: {}", self.row, self.severity, self.reason),
            None => write!(f, "row {} ({}): {}", self.row, self.severity, self.reason),
        }
    }
}
