//! Per-bar threshold levels produced by the walk-forward engine.

use serde::{Deserialize, Serialize};

/// Threshold estimate for one confidence level at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLevel {
    pub confidence: f64,
    /// Gap threshold in percent, never below the 0.5% floor.
    pub threshold_pct: f64,
    /// `prev_close * (1 - threshold_pct / 100)`
    pub threshold_price: f64,
    /// True when the bar's low touched or crossed `threshold_price`.
    pub signal: bool,
}

/// Threshold levels for a single bar, one slot per configured confidence level.
///
/// `levels[k]` corresponds to `confidence_levels[k]` of the configuration and
/// is `None` while the estimate is undefined (warmup, too few prior gaps, or
/// missing previous close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarThresholds {
    pub bar_index: usize,
    pub levels: Vec<Option<ThresholdLevel>>,
}

impl BarThresholds {
    pub fn undefined(bar_index: usize, n_levels: usize) -> Self {
        Self {
            bar_index,
            levels: vec![None; n_levels],
        }
    }

    pub fn is_defined(&self) -> bool {
        self.levels.iter().any(Option::is_some)
    }

    /// Signal for the level at `slot`. Undefined levels read as "no signal".
    pub fn signal(&self, slot: usize) -> bool {
        self.levels
            .get(slot)
            .copied()
            .flatten()
            .map(|level| level.signal)
            .unwrap_or(false)
    }
}
