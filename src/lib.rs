//! Batch statistics over flamingo population survey data.
//!
//! A run loads a CSV of observations, cleans it into typed records, computes
//! grouped summaries, 2020 to 2023 trends, correlations and a normality test,
//! and lays the results out as a report.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use flamingo_analytics::pipeline::analyze_file;
//! use flamingo_analytics::report::{assemble::assemble, render::render_text};
//!
//! let analysis = analyze_file(Path::new("data/flamingo_data.csv"), 0.05)?;
//! let report = assemble(&analysis, "Flamingo report");
//! println!("{}", render_text(&report));
//! # Ok::<(), flamingo_analytics::error::LoadError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stats;
