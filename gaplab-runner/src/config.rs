//! Run-file configuration.
//!
//! A run file is TOML with three optional tables:
//!
//! ```toml
//! [analysis]
//! confidence_levels = [0.68, 0.90, 0.95]
//! n_monte_carlo = 1000
//!
//! [data]
//! csv_dir = "data"
//!
//! [output]
//! dir = "gaplab_results"
//! ```
//!
//! Every missing field falls back to its default.

use chrono::NaiveDate;
use gaplab_core::{AnalysisConfig, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data_loader::{BarSource, CsvSource, SyntheticSource};

/// Errors from loading a run file.
#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("read run file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse run file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid analysis config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Where bars come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of `<SYMBOL>.csv` files. When unset, synthetic bars are generated.
    pub csv_dir: Option<PathBuf>,
    /// Trading days of synthetic history per symbol.
    pub synthetic_days: usize,
    /// Last synthetic date (inclusive). Defaults to 2024-12-31 so runs are reproducible.
    pub end_date: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_dir: None,
            synthetic_days: 1_260,
            end_date: None,
        }
    }
}

impl DataConfig {
    /// Build the configured bar source.
    pub fn source(&self) -> Box<dyn BarSource> {
        match &self.csv_dir {
            Some(dir) => Box::new(CsvSource::new(dir)),
            None => {
                let end = self
                    .end_date
                    .unwrap_or_else(SyntheticSource::default_end_date);
                Box::new(SyntheticSource::new(self.synthetic_days, end))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write per-symbol artifacts. The summary is always printed.
    pub save: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("gaplab_results"),
            save: true,
        }
    }
}

/// Complete, serializable description of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RunConfig {
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl RunConfig {
    /// Load and validate a run file.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a run file's contents.
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Deterministic hash of the analysis parameters.
    ///
    /// Two runs with the same hash and the same dataset hash produce identical reports.
    pub fn config_hash(&self) -> String {
        config_hash(&self.analysis)
    }
}

/// BLAKE3 over the JSON form of an analysis config.
pub fn config_hash(config: &AnalysisConfig) -> String {
    // Serializing a struct of plain numbers and vectors cannot fail.
    let json = serde_json::to_string(config).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.analysis.confidence_levels, vec![0.68, 0.90, 0.95]);
        assert_eq!(config.output.dir, PathBuf::from("gaplab_results"));
        assert!(config.data.csv_dir.is_none());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = RunConfig::from_toml(
            r#"
            [analysis]
            n_monte_carlo = 1000
            confidence_levels = [0.9, 0.99]

            [data]
            csv_dir = "bars"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.n_monte_carlo, 1000);
        assert_eq!(config.analysis.confidence_levels, vec![0.9, 0.99]);
        assert_eq!(config.analysis.profit_target, 0.01);
        assert_eq!(config.data.csv_dir, Some(PathBuf::from("bars")));
        assert_eq!(config.data.synthetic_days, 1_260);
        assert!(config.output.save);
    }

    #[test]
    fn invalid_analysis_is_rejected_on_load() {
        let err = RunConfig::from_toml(
            r#"
            [analysis]
            confidence_levels = [0.9, 1.5]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RunConfigError::Invalid(ConfigError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RunConfig::from_toml("[analysis\nseed = ").unwrap_err();
        assert!(matches!(err, RunConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = RunConfig::from_file(Path::new("/nonexistent/gaplab.toml")).unwrap_err();
        assert!(matches!(err, RunConfigError::Read { .. }));
    }

    #[test]
    fn config_hash_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = a.clone();
        assert_eq!(a.config_hash(), b.config_hash());
        b.analysis.seed = 7;
        assert_ne!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn output_settings_do_not_change_hash() {
        let a = RunConfig::default();
        let mut b = a.clone();
        b.output.dir = PathBuf::from("elsewhere");
        assert_eq!(a.config_hash(), b.config_hash());
    }
}
