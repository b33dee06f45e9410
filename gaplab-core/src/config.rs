//! Analysis configuration and fail-fast validation.
//!
//! Every computation entry point assumes a validated config. `validate()` is
//! the only place configuration problems surface; data sparsity during the
//! run never produces an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance used when comparing configured floats (ratio sums, level lookup).
const FLOAT_TOLERANCE: f64 = 1e-9;

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no confidence levels configured")]
    NoConfidenceLevels,
    #[error("confidence level {value} must lie strictly between 0 and 1")]
    ConfidenceOutOfRange { value: f64 },
    #[error("confidence levels must be strictly increasing ({previous} then {value})")]
    ConfidenceNotIncreasing { previous: f64, value: f64 },
    #[error("signal confidence {value} is not one of the configured confidence levels")]
    SignalConfidenceNotConfigured { value: f64 },
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    #[error("{field} must be a finite value >= 0 (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie strictly between 0 and 1 (got {value})")]
    OpenUnitRange { field: &'static str, value: f64 },
    #[error("{field} must lie in [0, 1] (got {value})")]
    RatioOutOfRange { field: &'static str, value: f64 },
    #[error("train/validation/test ratios must sum to 1 (got {sum})")]
    RatioSum { sum: f64 },
}

/// Parameters shared by the threshold engine, backtest, and validators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // ── Chronological split (reporting only) ──
    pub train_ratio: f64,
    pub validation_ratio: f64,
    pub test_ratio: f64,

    // ── Windows ──
    pub min_window_size: usize,
    pub rolling_window: usize,
    /// First bar index at which thresholds may be defined.
    pub min_periods: usize,
    /// Minimum number of defined prior gaps for a threshold estimate.
    pub min_sample_size: usize,

    // ── Thresholds ──
    /// Ordered set of confidence levels, each in (0, 1).
    pub confidence_levels: Vec<f64>,
    /// Level whose signal drives the backtest. `None` selects the highest.
    pub signal_confidence: Option<f64>,

    // ── Validation ──
    pub n_monte_carlo: usize,
    pub n_bootstrap: usize,
    pub significance_level: f64,
    pub seed: u64,

    // ── Trading ──
    pub profit_target: f64,
    pub initial_capital: f64,
    pub position_size: u32,
    /// Fraction of traded notional charged per side. Applied by reporting only.
    pub transaction_cost: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            validation_ratio: 0.15,
            test_ratio: 0.15,
            min_window_size: 60,
            rolling_window: 20,
            min_periods: 30,
            min_sample_size: 30,
            confidence_levels: vec![0.68, 0.90, 0.95],
            signal_confidence: None,
            n_monte_carlo: 500,
            n_bootstrap: 500,
            significance_level: 0.05,
            seed: 42,
            profit_target: 0.01,
            initial_capital: 10_000.0,
            position_size: 100,
            transaction_cost: 0.001,
        }
    }
}

impl AnalysisConfig {
    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confidence_levels.is_empty() {
            return Err(ConfigError::NoConfidenceLevels);
        }
        let mut previous: Option<f64> = None;
        for &value in &self.confidence_levels {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::ConfidenceOutOfRange { value });
            }
            if let Some(prev) = previous {
                if value <= prev {
                    return Err(ConfigError::ConfidenceNotIncreasing {
                        previous: prev,
                        value,
                    });
                }
            }
            previous = Some(value);
        }
        if let Some(value) = self.signal_confidence {
            if self.level_slot(value).is_none() {
                return Err(ConfigError::SignalConfidenceNotConfigured { value });
            }
        }

        let counts: [(&'static str, usize); 7] = [
            ("min_window_size", self.min_window_size),
            ("rolling_window", self.rolling_window),
            ("min_periods", self.min_periods),
            ("min_sample_size", self.min_sample_size),
            ("n_monte_carlo", self.n_monte_carlo),
            ("n_bootstrap", self.n_bootstrap),
            ("position_size", self.position_size as usize),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::NonPositive { field });
        }

        if !(self.transaction_cost.is_finite() && self.transaction_cost >= 0.0) {
            return Err(ConfigError::Negative {
                field: "transaction_cost",
                value: self.transaction_cost,
            });
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::OpenUnitRange {
                field: "significance_level",
                value: self.significance_level,
            });
        }
        if !(self.profit_target.is_finite() && self.profit_target > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "profit_target",
            });
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "initial_capital",
            });
        }

        let ratios = [
            ("train_ratio", self.train_ratio),
            ("validation_ratio", self.validation_ratio),
            ("test_ratio", self.test_ratio),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfRange { field, value });
            }
        }
        let sum = self.train_ratio + self.validation_ratio + self.test_ratio;
        if (sum - 1.0).abs() > FLOAT_TOLERANCE {
            return Err(ConfigError::RatioSum { sum });
        }

        Ok(())
    }

    /// Index of `confidence` within `confidence_levels`.
    pub fn level_slot(&self, confidence: f64) -> Option<usize> {
        self.confidence_levels
            .iter()
            .position(|&c| (c - confidence).abs() < FLOAT_TOLERANCE)
    }

    /// Slot of the level that drives the backtest: the configured
    /// `signal_confidence`, otherwise the highest level.
    pub fn signal_slot(&self) -> usize {
        self.signal_confidence
            .and_then(|c| self.level_slot(c))
            .unwrap_or_else(|| self.confidence_levels.len().saturating_sub(1))
    }

    /// Confidence value of the level that drives the backtest.
    pub fn signal_level(&self) -> f64 {
        self.confidence_levels
            .get(self.signal_slot())
            .copied()
            .unwrap_or(f64::NAN)
    }
}
