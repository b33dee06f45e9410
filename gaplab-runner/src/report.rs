//! Reporting and export: JSON report, CSV tapes, plain-text summary.
//!
//! Artifacts for one symbol live under `<output_dir>/<SYMBOL>/`:
//! - `report.json`: the `SymbolReport`, schema-versioned
//! - `trades.csv`: completed trades with pre-cost and net PnL
//! - `equity.csv`: bar-by-bar realized equity and position state
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gaplab_core::backtest::{BacktestResult, CostModel, PositionEvent};
use gaplab_core::domain::Trade;
use gaplab_core::stats::{mean, sample_std};
use gaplab_core::validation::{MonteCarloResult, ThresholdBootstrap, ValidationStatus};
use gaplab_core::AnalysisConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::analysis::SymbolAnalysis;
use crate::config::config_hash;
use crate::data_loader::is_path_safe_symbol;
use crate::metrics::{PerformanceSummary, SampleStatistics, SignalSummary};
use crate::split::{SplitReport, Segment};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unsupported schema version {found} (max supported: {max})", max = SCHEMA_VERSION)]
    UnsupportedSchema { found: u32 },
    #[error("'{symbol}' cannot be used as an artifact directory name")]
    InvalidSymbol { symbol: String },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ─── Report model ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub bars: usize,
}

/// Count, mean and std of the permutation null distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub observed_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub status: ValidationStatus,
    pub sample_size: usize,
    pub skipped_permutations: usize,
    pub null: NullSummary,
    /// Full null distribution; only present when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_distribution: Option<Vec<f64>>,
}

impl MonteCarloSummary {
    pub fn from_result(result: &MonteCarloResult, include_null: bool) -> Self {
        let null = &result.null_distribution;
        Self {
            observed_statistic: result.observed_statistic,
            p_value: result.p_value,
            significant: result.significant,
            status: result.status,
            sample_size: result.sample_size,
            skipped_permutations: result.skipped_permutations,
            null: NullSummary {
                count: null.len(),
                mean: mean(null),
                std: sample_std(null),
            },
            null_distribution: include_null.then(|| null.clone()),
        }
    }
}

/// Everything persisted for one analyzed symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub schema_version: u32,
    pub symbol: String,
    pub period: DataPeriod,
    pub dataset_hash: String,
    pub config_hash: String,
    pub config: AnalysisConfig,
    pub statistics: SampleStatistics,
    pub signals: SignalSummary,
    pub bootstrap: ThresholdBootstrap,
    pub monte_carlo: MonteCarloSummary,
    pub performance: PerformanceSummary,
    pub split: SplitReport,
}

impl SymbolReport {
    pub fn from_analysis(analysis: &SymbolAnalysis) -> Self {
        Self::build(analysis, false)
    }

    /// Same as `from_analysis`, keeping the full null distribution.
    pub fn with_null_distribution(analysis: &SymbolAnalysis) -> Self {
        Self::build(analysis, true)
    }

    fn build(analysis: &SymbolAnalysis, include_null: bool) -> Self {
        let config = &analysis.config;
        let statistics = SampleStatistics::compute(&analysis.derived);
        let costs = CostModel::new(config.transaction_cost);
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: analysis.symbol.clone(),
            period: DataPeriod {
                start: statistics.first_date,
                end: statistics.last_date,
                bars: statistics.observations,
            },
            dataset_hash: analysis.dataset_hash.clone(),
            config_hash: config_hash(config),
            config: config.clone(),
            signals: SignalSummary::compute(
                &analysis.thresholds,
                &config.confidence_levels,
                analysis.traded_confidence(),
            ),
            statistics,
            bootstrap: analysis.bootstrap.clone(),
            monte_carlo: MonteCarloSummary::from_result(&analysis.monte_carlo, include_null),
            performance: PerformanceSummary::compute(&analysis.backtest, &costs),
            split: SplitReport::build(&analysis.split, &analysis.backtest.trades),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SymbolReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SymbolReport, ReportError> {
    let report: SymbolReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ReportError::UnsupportedSchema {
            found: report.schema_version,
        });
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: entry_bar, entry_date, entry_price, exit_bar, exit_date,
/// exit_price, shares, bars_held, pnl, cost, net_pnl, return_pct
pub fn export_trades_csv(trades: &[Trade], costs: &CostModel) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "shares",
        "bars_held",
        "pnl",
        "cost",
        "net_pnl",
        "return_pct",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.entry_index.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_index.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &t.shares.to_string(),
            &t.bars_held().to_string(),
            &format!("{:.2}", t.pnl),
            &format!("{:.2}", costs.round_trip_cost(t)),
            &format!("{:.2}", costs.net_pnl(t)),
            &format!("{:.4}", t.return_pct() * 100.0),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

/// Columns: bar_index, date, equity, position_open, event
pub fn export_equity_csv(result: &BacktestResult) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "date", "equity", "position_open", "event"])?;
    for (point, record) in result.equity_curve.iter().zip(&result.bar_records) {
        let event = match record.event {
            Some(PositionEvent::Entry) => "entry",
            Some(PositionEvent::Exit) => "exit",
            None => "",
        };
        wtr.write_record([
            &record.bar_index.to_string(),
            &point.date.to_string(),
            &format!("{:.2}", point.equity),
            &record.position_open.to_string(),
            &event.to_string(),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `trades.csv` and `equity.csv` under
/// `<output_dir>/<SYMBOL>/`, replacing earlier files.
///
/// Returns the symbol's artifact directory.
pub fn save_artifacts(
    report: &SymbolReport,
    analysis: &SymbolAnalysis,
    output_dir: &Path,
) -> Result<PathBuf, ReportError> {
    if !is_path_safe_symbol(&report.symbol) {
        return Err(ReportError::InvalidSymbol {
            symbol: report.symbol.clone(),
        });
    }
    let dir = output_dir.join(&report.symbol);
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let report_path = dir.join("report.json");
    std::fs::write(&report_path, export_json(report)?).map_err(io_err(&report_path))?;

    let costs = CostModel::new(analysis.config.transaction_cost);
    let trades_path = dir.join("trades.csv");
    let trades_csv = export_trades_csv(&analysis.backtest.trades, &costs)?;
    std::fs::write(&trades_path, trades_csv).map_err(io_err(&trades_path))?;

    let equity_path = dir.join("equity.csv");
    std::fs::write(&equity_path, export_equity_csv(&analysis.backtest)?)
        .map_err(io_err(&equity_path))?;

    info!(symbol = %report.symbol, dir = %dir.display(), "artifacts written");
    Ok(dir)
}

/// Load a report from an artifact directory's `report.json`.
pub fn load_report(dir: &Path) -> Result<SymbolReport, ReportError> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path).map_err(io_err(&path))?;
    import_json(&json)
}

// ─── Plain-text summary ─────────────────────────────────────────────

fn opt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}%", v * 100.0))
}

/// Human-readable block for one symbol.
pub fn render_summary(report: &SymbolReport) -> String {
    let mut out = String::with_capacity(1024);
    let rule = "=".repeat(60);

    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!("OVERNIGHT GAP RECOVERY: {}\n", report.symbol));
    out.push_str(&format!("{rule}\n"));

    let period = match (report.period.start, report.period.end) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "n/a".to_string(),
    };
    out.push_str(&format!("Period:              {period} ({} bars)\n", report.period.bars));

    let s = &report.statistics;
    out.push_str(&format!("Mean daily return:   {}\n", opt_pct(s.mean_daily_return)));
    out.push_str(&format!("Annualized vol:      {}\n", opt_pct(s.annualized_volatility)));
    out.push_str(&format!("Mean overnight gap:  {}\n", opt_pct(s.mean_overnight_gap)));
    out.push_str(&format!("Recovery rate:       {}\n", opt_pct(s.recovery_rate)));

    out.push_str("\nThresholds (latest / bootstrap 90% interval):\n");
    for level in &report.signals.levels {
        let latest = level
            .latest_threshold_pct
            .map_or_else(|| "undefined".to_string(), |v| format!("{v:.3}%"));
        let interval = report
            .bootstrap
            .intervals
            .iter()
            .find(|i| (i.confidence - level.confidence).abs() < 1e-9)
            .map_or_else(String::new, |i| {
                format!("  [{:.3}%, {:.3}%]", i.ci_lower, i.ci_upper)
            });
        let marker = if (level.confidence - report.signals.traded_confidence).abs() < 1e-9 {
            " *"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:>5.1}%: {latest}{interval}  signals {}/{}{marker}\n",
            level.confidence * 100.0,
            level.signals,
            level.defined_bars,
        ));
    }

    let p = &report.performance;
    out.push_str("\nBacktest:\n");
    out.push_str(&format!(
        "  Trades:            {} ({} winners, {:.1}%)\n",
        p.total_trades, p.winning_trades, p.win_rate
    ));
    out.push_str(&format!("  Pre-cost PnL:      {:.2}\n", p.total_pnl));
    out.push_str(&format!("  Costs:             {:.2}\n", p.total_costs));
    out.push_str(&format!("  Net PnL:           {:.2}\n", p.net_pnl));
    out.push_str(&format!("  Final equity:      {:.2}\n", p.final_equity));
    out.push_str(&format!("  Max drawdown:      {:.2}%\n", p.max_drawdown * 100.0));
    if p.open_position {
        out.push_str(&format!("  Open position:     unrealized {:.2}\n", p.unrealized_pnl));
    }

    out.push_str("\nSplit (trades / PnL by exit bar):\n");
    for segment in [Segment::Train, Segment::Validation, Segment::Test] {
        if let Some(seg) = report.split.get(segment) {
            out.push_str(&format!(
                "  {:<11}{:>5} bars  {:>4} trades  {:>10.2}\n",
                format!("{segment:?}"),
                seg.bars,
                seg.trades,
                seg.pnl
            ));
        }
    }

    let mc = &report.monte_carlo;
    out.push_str("\nMonte Carlo permutation test:\n");
    match mc.status {
        ValidationStatus::Tested => {
            out.push_str(&format!(
                "  Correlation {:.4}, p-value {:.4} over {} permutations ({})\n",
                mc.observed_statistic,
                mc.p_value,
                mc.null.count,
                if mc.significant { "significant" } else { "not significant" }
            ));
        }
        ValidationStatus::InsufficientData => {
            out.push_str(&format!(
                "  Insufficient data ({} pairs), p-value {:.1}\n",
                mc.sample_size, mc.p_value
            ));
        }
        ValidationStatus::DegenerateStatistic => {
            out.push_str(&format!(
                "  Correlation undefined, p-value {:.1}\n",
                mc.p_value
            ));
        }
    }

    out
}
