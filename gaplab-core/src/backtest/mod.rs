//! Single-position backtest driven by threshold signals.

pub mod cost;
pub mod engine;
pub mod state;

pub use cost::CostModel;
pub use engine::{signals_for_slot, BacktestEngine, BacktestResult, BarRecord};
pub use state::{step, PositionEvent, PositionState, StepOutcome, TradeRules};
