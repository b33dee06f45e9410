//! Walk-forward gap threshold engine.
//!
//! For bar `i` the estimation window is every defined overnight gap of bars
//! `0..i`. The window grows with `i`; bar `i`'s own gap enters the window only
//! after bar `i` has been evaluated. Nothing at index `>= i` can influence the
//! threshold or signal of bar `i`.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::{BarThresholds, DerivedBar, ThresholdLevel};
use crate::stats;

use super::expanding::ExpandingQuantile;

/// Lower bound on any threshold, in percent.
pub const THRESHOLD_FLOOR_PCT: f64 = 0.5;

/// Floored threshold, in percent, from the `1 - confidence` gap quantile.
pub fn threshold_pct_from_quantile(gap_quantile: f64) -> f64 {
    (gap_quantile.abs() * 100.0).max(THRESHOLD_FLOOR_PCT)
}

/// Price that bar `i`'s low must reach for a signal.
pub fn threshold_price(prev_close: f64, threshold_pct: f64) -> f64 {
    prev_close * (1.0 - threshold_pct / 100.0)
}

#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    confidence_levels: Vec<f64>,
    min_periods: usize,
    min_sample_size: usize,
}

impl ThresholdEngine {
    pub fn new(confidence_levels: Vec<f64>, min_periods: usize, min_sample_size: usize) -> Self {
        Self {
            confidence_levels,
            min_periods,
            min_sample_size,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.confidence_levels.clone(),
            config.min_periods,
            config.min_sample_size,
        )
    }

    /// Thresholds for every bar, one `BarThresholds` per input bar.
    pub fn compute(&self, derived: &[DerivedBar]) -> Vec<BarThresholds> {
        let mut window = ExpandingQuantile::with_capacity(derived.len());
        let mut out = Vec::with_capacity(derived.len());

        for (i, row) in derived.iter().enumerate() {
            let thresholds = if i >= self.min_periods && window.len() >= self.min_sample_size {
                self.evaluate_bar(i, row, |q| window.quantile(q))
            } else {
                BarThresholds::undefined(i, self.confidence_levels.len())
            };
            out.push(thresholds);

            // Bar i joins the window only after its own evaluation.
            if let Some(gap) = row.overnight_gap {
                window.push(gap);
            }
        }

        debug!(
            bars = derived.len(),
            defined = out.iter().filter(|t| t.is_defined()).count(),
            "walk-forward thresholds computed"
        );
        out
    }

    /// Reference implementation: re-sorts the full prior window at every bar.
    ///
    /// Quadratic; kept to check `compute` against and for benchmarking.
    pub fn compute_naive(&self, derived: &[DerivedBar]) -> Vec<BarThresholds> {
        (0..derived.len())
            .map(|i| {
                if i < self.min_periods {
                    return BarThresholds::undefined(i, self.confidence_levels.len());
                }
                let prior: Vec<f64> = derived[..i]
                    .iter()
                    .filter_map(|d| d.overnight_gap)
                    .filter(|g| g.is_finite())
                    .collect();
                if prior.len() < self.min_sample_size {
                    return BarThresholds::undefined(i, self.confidence_levels.len());
                }
                self.evaluate_bar(i, &derived[i], |q| stats::quantile(&prior, q))
            })
            .collect()
    }

    fn evaluate_bar<F>(&self, index: usize, row: &DerivedBar, quantile: F) -> BarThresholds
    where
        F: Fn(f64) -> Option<f64>,
    {
        let low = row.bar.low;
        let prev_close = match row.prev_close {
            Some(pc) if low.is_finite() => pc,
            _ => return BarThresholds::undefined(index, self.confidence_levels.len()),
        };

        let levels = self
            .confidence_levels
            .iter()
            .map(|&confidence| {
                quantile(1.0 - confidence).map(|gap_q| {
                    let threshold_pct = threshold_pct_from_quantile(gap_q);
                    let price = threshold_price(prev_close, threshold_pct);
                    ThresholdLevel {
                        confidence,
                        threshold_pct,
                        threshold_price: price,
                        signal: low <= price,
                    }
                })
            })
            .collect();

        BarThresholds {
            bar_index: index,
            levels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_metrics;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    /// Bars whose overnight gaps cycle through a fixed pattern.
    fn gap_bars(n: usize) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let pattern = [-0.012, 0.004, -0.003, 0.008, -0.02, 0.001, -0.006];
        let mut close = 100.0;
        (0..n)
            .map(|i| {
                let open = close * (1.0 + pattern[i % pattern.len()]);
                let new_close = open * (1.0 + 0.002 * ((i % 3) as f64 - 1.0));
                let bar = PriceBar {
                    date: base + chrono::Duration::days(i as i64),
                    open,
                    high: open.max(new_close) * 1.004,
                    low: open.min(new_close) * 0.996,
                    close: new_close,
                    volume: 1_000,
                };
                close = new_close;
                bar
            })
            .collect()
    }

    #[test]
    fn floor_is_enforced() {
        assert_eq!(threshold_pct_from_quantile(0.0), THRESHOLD_FLOOR_PCT);
        assert_eq!(threshold_pct_from_quantile(-0.001), THRESHOLD_FLOOR_PCT);
        assert!((threshold_pct_from_quantile(-0.02) - 2.0).abs() < 1e-12);
        assert!((threshold_pct_from_quantile(0.03) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_price_formula() {
        assert!((threshold_price(200.0, 1.5) - 197.0).abs() < 1e-12);
    }

    #[test]
    fn warmup_bars_are_undefined() {
        let derived = derive_metrics(&gap_bars(80));
        let engine = ThresholdEngine::new(vec![0.68, 0.90, 0.95], 30, 30);
        let out = engine.compute(&derived);
        assert_eq!(out.len(), 80);
        for t in &out[..30] {
            assert!(t.levels.iter().all(Option::is_none));
            assert_eq!(t.levels.len(), 3);
        }
        // Bar 30 has 29 prior gaps (bar 0 has none), still short of 30.
        assert!(!out[30].is_defined());
        assert!(out[31].is_defined());
    }

    #[test]
    fn incremental_matches_naive_bit_for_bit() {
        let derived = derive_metrics(&gap_bars(150));
        let engine = ThresholdEngine::new(vec![0.68, 0.90, 0.95], 30, 30);
        let fast = engine.compute(&derived);
        let slow = engine.compute_naive(&derived);
        assert_eq!(fast.len(), slow.len());
        for (f, s) in fast.iter().zip(&slow) {
            for (a, b) in f.levels.iter().zip(&s.levels) {
                match (a, b) {
                    (None, None) => {}
                    (Some(a), Some(b)) => {
                        assert_eq!(a.threshold_pct.to_bits(), b.threshold_pct.to_bits());
                        assert_eq!(a.threshold_price.to_bits(), b.threshold_price.to_bits());
                        assert_eq!(a.signal, b.signal);
                    }
                    _ => panic!("definedness differs at bar {}", f.bar_index),
                }
            }
        }
    }

    #[test]
    fn signal_follows_low_versus_threshold_price() {
        let derived = derive_metrics(&gap_bars(120));
        let engine = ThresholdEngine::new(vec![0.95], 30, 30);
        for (t, d) in engine.compute(&derived).iter().zip(&derived) {
            if let Some(level) = t.levels[0] {
                assert_eq!(level.signal, d.bar.low <= level.threshold_price);
                assert!(level.threshold_pct >= THRESHOLD_FLOOR_PCT);
            }
        }
    }

    #[test]
    fn undefined_low_leaves_bar_undefined() {
        let mut bars = gap_bars(60);
        bars[50].low = f64::NAN;
        let derived = derive_metrics(&bars);
        let out = ThresholdEngine::new(vec![0.95], 30, 30).compute(&derived);
        assert!(!out[50].is_defined());
        assert!(out[49].is_defined());
    }

    #[test]
    fn from_config_uses_configured_windows() {
        let config = AnalysisConfig {
            min_periods: 40,
            min_sample_size: 10,
            confidence_levels: vec![0.9],
            ..Default::default()
        };
        let out = ThresholdEngine::from_config(&config).compute(&derive_metrics(&gap_bars(60)));
        assert!(!out[39].is_defined());
        assert!(out[40].is_defined());
        assert_eq!(out[40].levels[0].unwrap().confidence, 0.9);
    }
}
