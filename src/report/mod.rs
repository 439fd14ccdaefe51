//! Reporting: analysis results laid out as tables, chart data, and the
//! files written at the end of a run.
//!
//! ```text
//!  Analysis ──▶ assemble ──▶ Report ──┬──▶ render ──▶ report.json
//!     │                               │              analysis_report.txt
//!     └──────▶ chart ──▶ ChartSpec ───┘──▶ render ──▶ charts.json
//! ```

pub mod assemble;
pub mod chart;
pub mod render;
pub mod table;
