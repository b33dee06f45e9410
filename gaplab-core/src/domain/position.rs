use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position. The backtest holds at most one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: u32,
}

impl Position {
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.shares as f64
    }

    /// Price at which the profit target is reached.
    pub fn target_price(&self, profit_target: f64) -> f64 {
        self.entry_price * (1.0 + profit_target)
    }
}
