//! Per-bar derived metrics: returns, overnight gaps, and the recovery indicator.
//!
//! Pure transform: the output has the same length and order as the input, and
//! bar `i` only reads bars `i - 1` and `i`.

use crate::domain::{DerivedBar, PriceBar};

/// Derive metrics for every bar of an ordered series.
pub fn derive_metrics(bars: &[PriceBar]) -> Vec<DerivedBar> {
    let mut derived = Vec::with_capacity(bars.len());
    let mut prev: Option<&PriceBar> = None;

    for bar in bars {
        let row = match prev {
            None => DerivedBar::first(bar.clone()),
            Some(p) => derive_from_previous(p, bar),
        };
        derived.push(row);
        prev = Some(bar);
    }

    derived
}

fn derive_from_previous(prev: &PriceBar, bar: &PriceBar) -> DerivedBar {
    let prev_close = finite(prev.close);
    let prev_open = finite(prev.open);

    let daily_return = prev_close.and_then(|pc| finite(bar.close / pc - 1.0));
    let overnight_gap = prev_close.and_then(|pc| finite((bar.open - pc) / pc));
    let intraday_return = finite((bar.close - bar.open) / bar.open);

    let high_above_prev_close = match (prev_close, finite(bar.high)) {
        (Some(pc), Some(high)) => Some(high > pc),
        _ => None,
    };

    DerivedBar {
        bar: bar.clone(),
        prev_close,
        prev_open,
        daily_return,
        overnight_gap,
        intraday_return,
        high_above_prev_close,
        recovery_indicator: high_above_prev_close,
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
