use std::fs;
use std::path::{Path, PathBuf};

use lcc_core::errors::{ErrorInfo, LccError};
use serde::{Deserialize, Serialize};

use crate::serde::from_yaml_slice;

/// Result file written by the LCC simulation when no path is given.
pub const DEFAULT_INPUT: &str = "manual_results.csv";
/// Report title used when no scenario label is given.
pub const DEFAULT_SCENARIO: &str = "Simulation Results";
/// Two-sided confidence level of the reported intervals.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}

fn default_scenario() -> String {
    DEFAULT_SCENARIO.to_string()
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// Everything the pipeline needs to produce one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Location of the headerless result CSV.
    #[serde(default = "default_input")]
    pub input_path: PathBuf,
    /// Title printed in the report banner.
    #[serde(default = "default_scenario")]
    pub scenario_label: String,
    /// Two-sided confidence level, strictly between 0 and 1.
    #[serde(default = "default_confidence")]
    pub confidence_level: f64,
    /// Reject inputs whose runs do not all have the inferred node count.
    #[serde(default)]
    pub require_uniform_runs: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: default_input(),
            scenario_label: default_scenario(),
            confidence_level: DEFAULT_CONFIDENCE,
            require_uniform_runs: false,
        }
    }
}

impl AnalysisConfig {
    /// Checks the values that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), LccError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(LccError::Config(
                ErrorInfo::new(
                    "lcc_stats.confidence",
                    "confidence level must lie strictly between 0 and 1",
                )
                .with_context("confidence_level", self.confidence_level.to_string())
                .with_hint("use 0.95 for a 95% interval"),
            ));
        }
        if self.input_path.as_os_str().is_empty() {
            return Err(LccError::Config(ErrorInfo::new(
                "lcc_stats.input_path",
                "input path must not be empty",
            )));
        }
        Ok(())
    }
}

/// Loads an [`AnalysisConfig`] from a YAML file; absent keys take defaults.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, LccError> {
    let bytes = fs::read(path).map_err(|err| {
        LccError::Io(
            ErrorInfo::new("lcc_stats.config_read", "failed to read config file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalysisConfig::default());
    }
    from_yaml_slice(&bytes).map_err(|err| match err {
        LccError::Config(info) => {
            LccError::Config(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}
