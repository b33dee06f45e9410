//! Per-symbol analysis pipeline and batch runs.
//!
//! One symbol flows through: derive metrics → walk-forward thresholds →
//! backtest on the traded level → permutation test → threshold bootstrap.
//! Each stage is synchronous; a batch parallelizes across symbols only.

use gaplab_core::backtest::{BacktestEngine, BacktestResult};
use gaplab_core::domain::{BarThresholds, DerivedBar, PriceBar};
use gaplab_core::rng::{RngHierarchy, RngStream};
use gaplab_core::threshold::ThresholdEngine;
use gaplab_core::validation::{
    bootstrap_thresholds, BootstrapConfig, MonteCarloResult, PermutationTest, ThresholdBootstrap,
    ValidationStatus,
};
use gaplab_core::{derive_metrics, AnalysisConfig, ConfigError};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::data_loader::{check_symbol, dataset_hash, BarSource, LoadError};
use crate::split::SplitPlan;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Everything computed for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub dataset_hash: String,
    pub config: AnalysisConfig,
    pub derived: Vec<DerivedBar>,
    pub thresholds: Vec<BarThresholds>,
    /// Confidence slot whose signals drove the backtest.
    pub traded_slot: usize,
    pub backtest: BacktestResult,
    pub monte_carlo: MonteCarloResult,
    pub bootstrap: ThresholdBootstrap,
    pub split: SplitPlan,
}

impl SymbolAnalysis {
    pub fn traded_confidence(&self) -> f64 {
        self.config
            .confidence_levels
            .get(self.traded_slot)
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Bars with at least one defined threshold level.
    pub fn defined_threshold_bars(&self) -> usize {
        self.thresholds.iter().filter(|t| t.is_defined()).count()
    }
}

/// Run the full pipeline on one symbol's bars.
///
/// The config is validated first; data sparsity never fails, it yields
/// undefined thresholds, no trades, or a degenerate validation result.
pub fn analyze_symbol(
    symbol: &str,
    bars: &[PriceBar],
    config: &AnalysisConfig,
) -> Result<SymbolAnalysis, RunError> {
    config.validate()?;
    info!(symbol, bars = bars.len(), "analysis start");

    let derived = derive_metrics(bars);
    let thresholds = ThresholdEngine::from_config(config).compute(&derived);

    let traded_slot = config.signal_slot();
    let backtest =
        BacktestEngine::from_config(config).run_with_thresholds(bars, &thresholds, traded_slot);

    let rngs = RngHierarchy::new(config.seed);
    let mut mc_rng = rngs.rng_for(symbol, RngStream::MonteCarlo);
    let monte_carlo = PermutationTest::from_config(config).run(&derived, &mut mc_rng);
    let mut boot_rng = rngs.rng_for(symbol, RngStream::Bootstrap);
    let bootstrap = bootstrap_thresholds(&derived, &BootstrapConfig::from_config(config), &mut boot_rng);

    let split = SplitPlan::from_ratios(
        bars.len(),
        config.train_ratio,
        config.validation_ratio,
        config.test_ratio,
    );

    let analysis = SymbolAnalysis {
        symbol: symbol.to_string(),
        dataset_hash: dataset_hash(symbol, bars),
        config: config.clone(),
        derived,
        thresholds,
        traded_slot,
        backtest,
        monte_carlo,
        bootstrap,
        split,
    };

    if analysis.monte_carlo.status != ValidationStatus::Tested {
        warn!(
            symbol,
            status = ?analysis.monte_carlo.status,
            pairs = analysis.monte_carlo.sample_size,
            "monte carlo validation degenerate"
        );
    }
    info!(
        symbol,
        defined = analysis.defined_threshold_bars(),
        trades = analysis.backtest.trades.len(),
        p_value = analysis.monte_carlo.p_value,
        "analysis complete"
    );
    Ok(analysis)
}

/// Load bars from `source` and analyze.
pub fn analyze_from_source(
    symbol: &str,
    source: &dyn BarSource,
    config: &AnalysisConfig,
) -> Result<SymbolAnalysis, RunError> {
    check_symbol(symbol)?;
    let bars = source.load(symbol)?;
    analyze_symbol(symbol, &bars, config)
}

/// A symbol that could not be analyzed.
#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: RunError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful analyses in input order.
    pub analyses: Vec<SymbolAnalysis>,
    pub failures: Vec<SymbolFailure>,
}

/// Analyze several symbols in parallel.
///
/// Config problems abort before any symbol is touched. Per-symbol failures
/// are logged and collected; they never stop the other symbols.
pub fn analyze_batch(
    symbols: &[String],
    source: &dyn BarSource,
    config: &AnalysisConfig,
) -> Result<BatchOutcome, RunError> {
    config.validate()?;
    info!(symbols = symbols.len(), source = %source.describe(), "batch start");

    let results: Vec<(String, Result<SymbolAnalysis, RunError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let local = config.clone();
            (symbol.clone(), analyze_from_source(symbol, source, &local))
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (symbol, result) in results {
        match result {
            Ok(analysis) => outcome.analyses.push(analysis),
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "symbol failed");
                outcome.failures.push(SymbolFailure { symbol, error });
            }
        }
    }
    info!(
        ok = outcome.analyses.len(),
        failed = outcome.failures.len(),
        "batch complete"
    );
    Ok(outcome)
}
