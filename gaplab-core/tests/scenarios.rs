//! Worked scenarios with hand-checkable numbers.

use chrono::NaiveDate;
use gaplab_core::backtest::{BacktestEngine, TradeRules};
use gaplab_core::derive_metrics;
use gaplab_core::domain::PriceBar;
use gaplab_core::rng::{RngHierarchy, RngStream};
use gaplab_core::stats::quantile;
use gaplab_core::threshold::{ThresholdEngine, THRESHOLD_FLOOR_PCT};
use gaplab_core::validation::{PermutationTest, ValidationStatus};

fn date(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// Bars built from a list of overnight gaps; bar 0 opens at 100.
fn bars_from_gaps(gaps: &[f64]) -> Vec<PriceBar> {
    let mut prev_close = 100.0;
    gaps.iter()
        .enumerate()
        .map(|(i, &gap)| {
            let open = if i == 0 { prev_close } else { prev_close * (1.0 + gap) };
            let close = open * (1.0 + 0.001 * ((i % 5) as f64 - 2.0));
            let bar = PriceBar {
                date: date(i),
                open,
                high: open.max(close) * 1.003,
                low: open.min(close) * 0.997,
                close,
                volume: 10_000,
            };
            prev_close = close;
            bar
        })
        .collect()
}

#[test]
fn threshold_at_bar_45_uses_gaps_before_45() {
    let pattern = [-0.004, 0.002, -0.009, 0.006, -0.013, 0.001, -0.002, 0.011];
    let mut gaps: Vec<f64> = (0..60).map(|i| pattern[i % pattern.len()]).collect();
    gaps[45] = -0.02;
    let mut bars = bars_from_gaps(&gaps);
    // Bar 45 trades down to 1% below its open.
    bars[45].low = bars[45].open * 0.99;

    let derived = derive_metrics(&bars);
    assert!((derived[45].overnight_gap.unwrap() - (-0.02)).abs() < 1e-12);

    let thresholds = ThresholdEngine::new(vec![0.95], 30, 30).compute(&derived);
    let level = thresholds[45].levels[0].expect("bar 45 has a threshold");

    let prior: Vec<f64> = derived[..45].iter().filter_map(|d| d.overnight_gap).collect();
    let expected_pct = (quantile(&prior, 1.0 - 0.95).unwrap().abs() * 100.0).max(THRESHOLD_FLOOR_PCT);
    assert_eq!(level.threshold_pct.to_bits(), expected_pct.to_bits());

    let prev_close = derived[45].prev_close.unwrap();
    let expected_price = prev_close * (1.0 - expected_pct / 100.0);
    assert_eq!(level.threshold_price.to_bits(), expected_price.to_bits());

    assert_eq!(level.signal, bars[45].low <= expected_price);
    // Prior gaps bottom out at -1.3%, the low sits ~2.98% under prev close.
    assert!(level.signal);
}

#[test]
fn entry_at_100_exit_at_101_realizes_100() {
    let bars: Vec<PriceBar> = (0..20)
        .map(|i| PriceBar {
            date: date(i),
            open: 100.0,
            high: if i == 13 { 101.0 } else { 100.4 },
            low: 99.6,
            close: 100.0,
            volume: 1_000,
        })
        .collect();
    let mut signals = vec![false; 20];
    signals[10] = true;

    let engine = BacktestEngine::new(
        TradeRules {
            profit_target: 0.01,
            shares: 100,
        },
        25_000.0,
    );
    let result = engine.run(&bars, &signals);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, 100.0);
    assert_eq!(trade.entry_date, date(10));
    assert_eq!(trade.exit_date, date(13));
    assert!((trade.pnl - 100.0).abs() < 1e-9);
    assert!((result.equity_curve[13].equity - 25_100.0).abs() < 1e-9);
    assert!((result.final_equity - 25_100.0).abs() < 1e-9);
}

#[test]
fn always_recovering_series_has_p_value_one() {
    // Every high clears the previous close: the recovery column is constant.
    let bars: Vec<PriceBar> = (0..120)
        .map(|i| {
            let base = 100.0 + ((i * 17 % 11) as f64 - 5.0);
            PriceBar {
                date: date(i),
                open: base,
                high: 200.0 + i as f64,
                low: base - 1.0,
                close: base,
                volume: 1_000,
            }
        })
        .collect();
    let derived = derive_metrics(&bars);
    assert!(derived[1..].iter().all(|d| d.recovery_indicator == Some(true)));

    let mut rng = RngHierarchy::new(42).rng_for("FLAT", RngStream::MonteCarlo);
    let result = PermutationTest::new(200, 0.05).run(&derived, &mut rng);
    assert_eq!(result.p_value, 1.0);
    assert!(result.null_distribution.is_empty());
    assert_eq!(result.status, ValidationStatus::DegenerateStatistic);
    assert!(!result.significant);
}

#[test]
fn short_history_gives_degenerate_monte_carlo() {
    let gaps = vec![-0.01; 40];
    let derived = derive_metrics(&bars_from_gaps(&gaps));
    let mut rng = RngHierarchy::new(1).rng_for("SHORT", RngStream::MonteCarlo);
    let result = PermutationTest::new(100, 0.05).run(&derived, &mut rng);
    assert_eq!(result.p_value, 1.0);
    assert_eq!(result.observed_statistic, 0.0);
    assert_eq!(result.status, ValidationStatus::InsufficientData);
}
