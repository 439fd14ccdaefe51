use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use flamingo_analytics::config::Config;
use flamingo_analytics::pipeline::analyze_file;
use flamingo_analytics::report::assemble::assemble;
use flamingo_analytics::report::chart::prepare_charts;
use flamingo_analytics::report::render::write_outputs;

#[derive(Parser)]
#[command(name = "flamingo-analytics")]
#[command(about = "Population statistics for flamingo survey data")]
#[command(version)]
struct Cli {
    /// CSV file of observations
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Directory the report files are written to
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Significance level for the correlation and normality tests
    #[arg(long)]
    alpha: Option<f64>,
    /// Skip writing charts.json
    #[arg(long)]
    no_charts: bool,
}

impl Cli {
    /// File settings first, then flags on top.
    fn resolve(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(input) = self.input {
            config.analysis.input = input;
        }
        if let Some(output) = self.output {
            config.output.directory = output;
        }
        if let Some(alpha) = self.alpha {
            config.analysis.significance_level = alpha;
        }
        if self.no_charts {
            config.output.write_charts = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().resolve().context("configuration")?;
    let input = &config.analysis.input;

    info!("Loading data from {}", input.display());
    let analysis = analyze_file(input, config.analysis.significance_level)
        .with_context(|| format!("loading {}", input.display()))?;

    if analysis.rejected_rows() > 0 {
        warn!(
            "{} of {} rows rejected, see the diagnostics section",
            analysis.rejected_rows(),
            analysis.rows_read
        );
    }

    let report = assemble(&analysis, &config.output.report_title);
    let charts = config.output.write_charts.then(|| prepare_charts(&analysis));

    let written = write_outputs(&config.output.directory, &report, charts.as_deref())
        .context("writing outputs")?;

    info!(
        "Analysis complete: {} observations, {} files written to {}",
        analysis.dataset.len(),
        written.len(),
        config.output.directory.display()
    );
    Ok(())
}
