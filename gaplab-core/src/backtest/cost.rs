//! Cost model: transaction costs applied on top of pre-cost trade PnL.
//!
//! The state machine never sees costs. Reporting asks the cost model for
//! cost-adjusted figures so gross and net PnL stay separately visible.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Fraction of traded notional charged on each side (0.001 = 10 bps).
    pub transaction_cost: f64,
}

impl CostModel {
    pub fn new(transaction_cost: f64) -> Self {
        Self { transaction_cost }
    }

    /// Cost of one side: `price * shares * transaction_cost`.
    pub fn side_cost(&self, price: f64, shares: u32) -> f64 {
        price * shares as f64 * self.transaction_cost
    }

    /// Entry side plus exit side.
    pub fn round_trip_cost(&self, trade: &Trade) -> f64 {
        self.side_cost(trade.entry_price, trade.shares) + self.side_cost(trade.exit_price, trade.shares)
    }

    pub fn net_pnl(&self, trade: &Trade) -> f64 {
        trade.pnl - self.round_trip_cost(trade)
    }
}
