//! Domain types for gap analysis.

pub mod bar;
pub mod equity;
pub mod position;
pub mod threshold;
pub mod trade;

pub use bar::{DerivedBar, PriceBar};
pub use equity::{max_drawdown, EquityPoint};
pub use position::Position;
pub use threshold::{BarThresholds, ThresholdLevel};
pub use trade::Trade;
