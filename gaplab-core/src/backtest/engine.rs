//! Bar loop driving the position state machine.
//!
//! Bars are processed strictly in order; bar `i`'s transition is resolved
//! before bar `i + 1` is looked at. Equity is realized-only: it changes on
//! exit bars and is carried forward on every other bar.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::{BarThresholds, EquityPoint, Position, PriceBar, Trade};

use super::state::{step, PositionEvent, PositionState, TradeRules};

/// Per-bar trace of the backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub bar_index: usize,
    pub event: Option<PositionEvent>,
    /// Position held after this bar's transition.
    pub position_open: bool,
    pub equity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub trades: Vec<Trade>,
    /// One point per input bar.
    pub equity_curve: Vec<EquityPoint>,
    pub bar_records: Vec<BarRecord>,
    /// Position still held after the last bar. Never force-closed.
    pub open_position: Option<Position>,
    /// Mark-to-market PnL of `open_position` at the last close; 0.0 when flat.
    pub unrealized_pnl: f64,
    /// Sum of pre-cost trade PnL.
    pub realized_pnl: f64,
    /// `initial_capital + realized_pnl`.
    pub final_equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestEngine {
    rules: TradeRules,
    initial_capital: f64,
}

impl BacktestEngine {
    pub fn new(rules: TradeRules, initial_capital: f64) -> Self {
        Self {
            rules,
            initial_capital,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            TradeRules {
                profit_target: config.profit_target,
                shares: config.position_size,
            },
            config.initial_capital,
        )
    }

    /// Run over `bars` with one entry signal per bar.
    ///
    /// A bar without a corresponding entry in `signals` is treated as "no signal".
    pub fn run(&self, bars: &[PriceBar], signals: &[bool]) -> BacktestResult {
        let mut state = PositionState::Idle;
        let mut equity = self.initial_capital;
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut bar_records = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let signal = signals.get(i).copied().unwrap_or(false);
            let outcome = step(state, i, bar, signal, &self.rules);

            if let Some(trade) = outcome.trade {
                equity += trade.pnl;
                trades.push(trade);
            }
            state = outcome.state;

            equity_curve.push(EquityPoint {
                date: bar.date,
                equity,
            });
            bar_records.push(BarRecord {
                bar_index: i,
                event: outcome.event,
                position_open: state.is_open(),
                equity,
            });
        }

        let open_position = state.position().cloned();
        let unrealized_pnl = match (&open_position, bars.last()) {
            (Some(pos), Some(last)) => pos.unrealized_pnl(last.close),
            _ => 0.0,
        };
        let realized_pnl: f64 = trades.iter().map(|t| t.pnl).sum();

        debug!(
            bars = bars.len(),
            trades = trades.len(),
            open = open_position.is_some(),
            "backtest complete"
        );

        BacktestResult {
            initial_capital: self.initial_capital,
            trades,
            equity_curve,
            bar_records,
            open_position,
            unrealized_pnl,
            realized_pnl,
            final_equity: equity,
        }
    }

    /// Run using the signals of threshold slot `slot`.
    pub fn run_with_thresholds(
        &self,
        bars: &[PriceBar],
        thresholds: &[BarThresholds],
        slot: usize,
    ) -> BacktestResult {
        self.run(bars, &signals_for_slot(thresholds, slot))
    }
}

/// Entry signals for one confidence slot; undefined levels become `false`.
pub fn signals_for_slot(thresholds: &[BarThresholds], slot: usize) -> Vec<bool> {
    thresholds.iter().map(|t| t.signal(slot)).collect()
}
