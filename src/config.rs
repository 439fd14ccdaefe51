use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::stats::correlation::DEFAULT_SIGNIFICANCE_LEVEL;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Settings for one batch run. Every key is optional in the TOML file:
///
/// ```toml
/// [analysis]
/// input = "data/flamingo_data.csv"
/// significance_level = 0.05
///
/// [output]
/// directory = "outputs"
/// write_charts = true
/// report_title = "Flamingo Population Data Analytics Report"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis: AnalysisSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    pub input: PathBuf,
    /// α for the correlation and normality tests.
    pub significance_level: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub directory: PathBuf,
    pub write_charts: bool,
    pub report_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisSection::default(),
            output: OutputSection::default(),
        }
    }
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/flamingo_data.csv"),
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs"),
            write_charts: true,
            report_title: "Flamingo Population Data Analytics Report".to_string(),
        }
    }
}

impl Config {
    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("parsing TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let alpha = self.analysis.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            bail!("significance_level must lie strictly between 0 and 1, got {alpha}");
        }
        Ok(())
    }
}
