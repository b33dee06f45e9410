//! GapLab Core: overnight gap thresholds, single-position backtest, permutation validation.
//!
//! This crate contains the pure, synchronous parts of the analysis:
//! - Domain types (price bars, derived bars, threshold levels, positions, trades)
//! - Per-bar metric derivation (returns, overnight gap, recovery indicator)
//! - Walk-forward threshold estimation using strictly prior bars only
//! - Single-position backtest as an explicit state machine
//! - Permutation significance test and threshold bootstrap with injected RNG
//! - Configuration with fail-fast validation
//! - Deterministic per-symbol RNG hierarchy

pub mod backtest;
pub mod config;
pub mod derive;
pub mod domain;
pub mod rng;
pub mod stats;
pub mod threshold;
pub mod validation;

pub use config::{AnalysisConfig, ConfigError};
pub use derive::derive_metrics;
