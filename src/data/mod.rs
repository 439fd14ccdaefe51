//! Data layer: core types, loading, and cleaning.
//!
//! Architecture:
//! ```text
//!  flamingo_data.csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse CSV → RawObservation rows + RowIssue diagnostics
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  cleaner  │  unknowns → None, categories → closed vocabularies
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Observation>, read-only from here on
//!   └──────────┘
//! ```

pub mod cleaner;
pub mod loader;
pub mod model;
