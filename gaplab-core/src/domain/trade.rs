//! Trade: a completed entry → exit round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed round trip. `pnl` is before transaction costs; cost-adjusted
/// figures are computed by `backtest::CostModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size / PnL ──
    pub shares: u32,
    pub pnl: f64,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    /// Pre-cost return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.shares as f64;
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl / notional
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
