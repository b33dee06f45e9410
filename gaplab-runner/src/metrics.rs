//! Summary metrics: pure functions over derived bars, thresholds and backtest output.
//!
//! No dependencies on the data pipeline or on persistence.

use chrono::NaiveDate;
use gaplab_core::backtest::{BacktestResult, CostModel};
use gaplab_core::domain::{max_drawdown, BarThresholds, DerivedBar};
use gaplab_core::stats::{mean, sample_std};
use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Descriptive statistics of the analyzed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics {
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub mean_daily_return: Option<f64>,
    /// Sample std of daily returns times sqrt(252).
    pub annualized_volatility: Option<f64>,
    pub mean_overnight_gap: Option<f64>,
    /// Share of defined recovery indicators that are true.
    pub recovery_rate: Option<f64>,
}

impl SampleStatistics {
    pub fn compute(derived: &[DerivedBar]) -> Self {
        let returns: Vec<f64> = derived.iter().filter_map(|d| d.daily_return).collect();
        let gaps: Vec<f64> = derived.iter().filter_map(|d| d.overnight_gap).collect();
        let recoveries: Vec<bool> = derived.iter().filter_map(|d| d.recovery_indicator).collect();

        let recovery_rate = if recoveries.is_empty() {
            None
        } else {
            Some(recoveries.iter().filter(|&&r| r).count() as f64 / recoveries.len() as f64)
        };

        Self {
            observations: derived.len(),
            first_date: derived.first().map(DerivedBar::date),
            last_date: derived.last().map(DerivedBar::date),
            mean_daily_return: mean(&returns),
            annualized_volatility: sample_std(&returns).map(|s| s * TRADING_DAYS_PER_YEAR.sqrt()),
            mean_overnight_gap: mean(&gaps),
            recovery_rate,
        }
    }
}

/// Trade and equity outcome of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Percent, 0-100. Zero with no trades.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_costs: f64,
    pub net_pnl: f64,
    pub final_equity: f64,
    /// `(final_equity - initial) / initial`, pre-cost.
    pub total_return: f64,
    pub avg_bars_held: Option<f64>,
    pub open_position: bool,
    pub unrealized_pnl: f64,
    /// Positive fraction.
    pub max_drawdown: f64,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult, costs: &CostModel) -> Self {
        let trades = &result.trades;
        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let total_costs: f64 = trades.iter().map(|t| costs.round_trip_cost(t)).sum();
        let held: Vec<f64> = trades.iter().map(|t| t.bars_held() as f64).collect();

        Self {
            total_trades,
            winning_trades,
            win_rate: win_rate(winning_trades, total_trades),
            total_pnl: result.realized_pnl,
            total_costs,
            net_pnl: result.realized_pnl - total_costs,
            final_equity: result.final_equity,
            total_return: total_return(result.initial_capital, result.final_equity),
            avg_bars_held: mean(&held),
            open_position: result.open_position.is_some(),
            unrealized_pnl: result.unrealized_pnl,
            max_drawdown: max_drawdown(&result.equity_curve),
        }
    }
}

/// Defined thresholds and signals for one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSignals {
    pub confidence: f64,
    pub defined_bars: usize,
    pub signals: usize,
    /// Most recent defined threshold, if any.
    pub latest_threshold_pct: Option<f64>,
    pub latest_threshold_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub levels: Vec<LevelSignals>,
    /// Confidence level driving the backtest.
    pub traded_confidence: f64,
}

impl SignalSummary {
    pub fn compute(
        thresholds: &[BarThresholds],
        confidence_levels: &[f64],
        traded_confidence: f64,
    ) -> Self {
        let levels = confidence_levels
            .iter()
            .enumerate()
            .map(|(slot, &confidence)| {
                let defined: Vec<_> = thresholds
                    .iter()
                    .filter_map(|t| t.levels.get(slot).copied().flatten())
                    .collect();
                let latest = defined.last();
                LevelSignals {
                    confidence,
                    defined_bars: defined.len(),
                    signals: defined.iter().filter(|l| l.signal).count(),
                    latest_threshold_pct: latest.map(|l| l.threshold_pct),
                    latest_threshold_price: latest.map(|l| l.threshold_price),
                }
            })
            .collect();
        Self {
            levels,
            traded_confidence,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Winning share in percent. 0.0 when there are no trades.
pub fn win_rate(winners: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    winners as f64 / total as f64 * 100.0
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity - initial) / initial
}
