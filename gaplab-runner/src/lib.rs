//! GapLab Runner: analysis orchestration, bar sources, batch runs, reports.
//!
//! This crate builds on `gaplab-core` to provide:
//! - TOML run files with `[analysis]`, `[data]` and `[output]` tables
//! - Bar sources: CSV files and deterministic synthetic data
//! - The per-symbol pipeline and parallel batch analysis
//! - Sample statistics, signal counts, performance and split summaries
//! - JSON/CSV artifacts and a plain-text summary

pub mod analysis;
pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod report;
pub mod split;

pub use analysis::{
    analyze_batch, analyze_from_source, analyze_symbol, BatchOutcome, RunError, SymbolAnalysis,
    SymbolFailure,
};
pub use config::{config_hash, DataConfig, OutputConfig, RunConfig, RunConfigError};
pub use data_loader::{
    check_symbol, dataset_hash, is_path_safe_symbol, validate_bars, BarSource, CsvSource,
    LoadError, SyntheticSource,
};
pub use metrics::{PerformanceSummary, SampleStatistics, SignalSummary};
pub use report::{
    load_report, render_summary, save_artifacts, ReportError, SymbolReport, SCHEMA_VERSION,
};
pub use split::{Segment, SplitPlan, SplitReport};
