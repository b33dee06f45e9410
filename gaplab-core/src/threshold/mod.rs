//! Causal threshold estimation over overnight gaps.

pub mod engine;
pub mod expanding;

pub use engine::{
    threshold_pct_from_quantile, threshold_price, ThresholdEngine, THRESHOLD_FLOOR_PCT,
};
pub use expanding::ExpandingQuantile;
