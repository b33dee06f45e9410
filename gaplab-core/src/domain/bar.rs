//! Price bars and the per-bar quantities derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol.
///
/// Bars arrive from a data source already ordered by strictly increasing date
/// and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high is the bar maximum, low the minimum, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// A price bar together with the quantities that need the previous bar.
///
/// Every derived field is `None` on the first bar of a series. A field is also
/// `None` when its ratio would not be finite (e.g. a zero previous close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBar {
    pub bar: PriceBar,
    pub prev_close: Option<f64>,
    pub prev_open: Option<f64>,
    /// `close / prev_close - 1`
    pub daily_return: Option<f64>,
    /// `(open - prev_close) / prev_close`
    pub overnight_gap: Option<f64>,
    /// `(close - open) / open`
    pub intraday_return: Option<f64>,
    /// `high > prev_close`
    pub high_above_prev_close: Option<bool>,
    /// Currently the same value as `high_above_prev_close`. Kept as its own
    /// field: callers must not rely on the two staying equal.
    pub recovery_indicator: Option<bool>,
}

impl DerivedBar {
    /// Wraps a bar with every derived field undefined.
    pub fn first(bar: PriceBar) -> Self {
        Self {
            bar,
            prev_close: None,
            prev_open: None,
            daily_return: None,
            overnight_gap: None,
            intraday_return: None,
            high_above_prev_close: None,
            recovery_indicator: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }
}
