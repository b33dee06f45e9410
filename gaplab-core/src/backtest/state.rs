//! Single-position state machine.
//!
//! `Idle --signal--> Open --high reaches target--> Idle`. The state is a plain
//! value: `step` consumes the current state and returns the next one, so one
//! bar's transition can be tested in isolation.

use serde::{Deserialize, Serialize};

use crate::domain::{Position, PriceBar, Trade};

/// Current position state. There is never more than one open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum PositionState {
    #[default]
    Idle,
    Open(Position),
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open(_))
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Idle => None,
            PositionState::Open(pos) => Some(pos),
        }
    }
}

/// State change emitted by a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEvent {
    Entry,
    Exit,
}

/// Fixed trading parameters consulted on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRules {
    /// Fractional gain above entry that triggers the exit.
    pub profit_target: f64,
    /// Shares bought on every entry.
    pub shares: u32,
}

/// Result of advancing the machine by one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: PositionState,
    pub event: Option<PositionEvent>,
    /// Set only on the bar that closes a position.
    pub trade: Option<Trade>,
}

impl StepOutcome {
    fn unchanged(state: PositionState) -> Self {
        Self {
            state,
            event: None,
            trade: None,
        }
    }
}

/// Advance the machine by one bar.
///
/// - `Idle` + signal: enter at the bar's close.
/// - `Open` + high at or above target: exit at the target price.
/// - Otherwise the state carries forward. A bar that enters never also exits.
pub fn step(
    state: PositionState,
    bar_index: usize,
    bar: &PriceBar,
    signal: bool,
    rules: &TradeRules,
) -> StepOutcome {
    match state {
        PositionState::Idle => {
            if !signal || !bar.close.is_finite() {
                return StepOutcome::unchanged(PositionState::Idle);
            }
            StepOutcome {
                state: PositionState::Open(Position {
                    entry_index: bar_index,
                    entry_date: bar.date,
                    entry_price: bar.close,
                    shares: rules.shares,
                }),
                event: Some(PositionEvent::Entry),
                trade: None,
            }
        }
        PositionState::Open(position) => {
            let target = position.target_price(rules.profit_target);
            if bar.high.is_nan() || bar.high < target {
                return StepOutcome::unchanged(PositionState::Open(position));
            }
            let exit_price = target;
            let pnl = (exit_price - position.entry_price) * position.shares as f64;
            let trade = Trade {
                entry_index: position.entry_index,
                entry_date: position.entry_date,
                entry_price: position.entry_price,
                exit_index: bar_index,
                exit_date: bar.date,
                exit_price,
                shares: position.shares,
                pnl,
            };
            StepOutcome {
                state: PositionState::Idle,
                event: Some(PositionEvent::Exit),
                trade: Some(trade),
            }
        }
    }
}
