//! Property tests for analysis invariants.
//!
//! Uses proptest to verify:
//! 1. Threshold floor: threshold_pct never drops below 0.5%
//! 2. Warmup: bars before min_periods never carry a threshold
//! 3. Single position: at most one open position, trades never overlap
//! 4. Trade identity: pnl == (exit - entry) * shares, exit after entry
//! 5. Equity accounting: one point per bar, changes only on exit bars
//! 6. Permutation test: p-value in [0, 1], seed reproducibility

use chrono::NaiveDate;
use gaplab_core::backtest::{BacktestEngine, PositionEvent, TradeRules};
use gaplab_core::derive_metrics;
use gaplab_core::domain::PriceBar;
use gaplab_core::threshold::{ThresholdEngine, THRESHOLD_FLOOR_PCT};
use gaplab_core::validation::PermutationTest;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Strategies (proptest) ────────────────────────────────────────────

/// (overnight gap, intraday move, upper wick, lower wick) per bar.
fn arb_bar_moves(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (-0.04..0.04_f64, -0.03..0.03_f64, 0.0..0.02_f64, 0.0..0.02_f64),
        len,
    )
}

fn build_bars(moves: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut prev_close = 50.0;
    moves
        .iter()
        .enumerate()
        .map(|(i, &(gap, intraday, up, down))| {
            let open = prev_close * (1.0 + gap);
            let close = open * (1.0 + intraday);
            let bar = PriceBar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * (1.0 + up),
                low: open.min(close) * (1.0 - down),
                close,
                volume: 1_000,
            };
            prev_close = close;
            bar
        })
        .collect()
}

fn engine() -> BacktestEngine {
    BacktestEngine::new(
        TradeRules {
            profit_target: 0.01,
            shares: 100,
        },
        10_000.0,
    )
}

// ── 1–2. Thresholds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn threshold_pct_respects_floor(moves in arb_bar_moves(40..160)) {
        let derived = derive_metrics(&build_bars(&moves));
        let out = ThresholdEngine::new(vec![0.68, 0.90, 0.95], 30, 30).compute(&derived);
        for t in &out {
            for level in t.levels.iter().flatten() {
                prop_assert!(level.threshold_pct >= THRESHOLD_FLOOR_PCT);
            }
        }
    }

    #[test]
    fn nothing_defined_before_min_periods(
        moves in arb_bar_moves(20..120),
        min_periods in 1usize..60,
    ) {
        let derived = derive_metrics(&build_bars(&moves));
        let out = ThresholdEngine::new(vec![0.9, 0.95], min_periods, 10).compute(&derived);
        for t in out.iter().take(min_periods) {
            prop_assert!(t.levels.iter().all(Option::is_none));
        }
    }
}

// ── 3–5. Backtest ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn single_position_and_trade_identity(
        moves in arb_bar_moves(5..200),
        signal_bits in prop::collection::vec(prop::bool::weighted(0.2), 200),
    ) {
        let bars = build_bars(&moves);
        let result = engine().run(&bars, &signal_bits);

        // Trades never overlap: each entry comes after the previous exit.
        for pair in result.trades.windows(2) {
            prop_assert!(pair[1].entry_index > pair[0].exit_index);
        }
        for trade in &result.trades {
            prop_assert!(trade.exit_date > trade.entry_date);
            prop_assert!(trade.exit_index > trade.entry_index);
            prop_assert_eq!(trade.pnl, (trade.exit_price - trade.entry_price) * trade.shares as f64);
        }

        // Entries and exits alternate, starting with an entry.
        let mut open = false;
        for record in &result.bar_records {
            match record.event {
                Some(PositionEvent::Entry) => { prop_assert!(!open); open = true; }
                Some(PositionEvent::Exit) => { prop_assert!(open); open = false; }
                None => {}
            }
            prop_assert_eq!(open, record.position_open);
        }
        prop_assert_eq!(open, result.open_position.is_some());
    }

    #[test]
    fn equity_changes_only_on_exit_bars(
        moves in arb_bar_moves(5..200),
        signal_bits in prop::collection::vec(prop::bool::weighted(0.3), 200),
    ) {
        let bars = build_bars(&moves);
        let result = engine().run(&bars, &signal_bits);
        prop_assert_eq!(result.equity_curve.len(), bars.len());

        let mut previous = 10_000.0;
        for (point, record) in result.equity_curve.iter().zip(&result.bar_records) {
            if record.event == Some(PositionEvent::Exit) {
                prop_assert!(point.equity > previous);
            } else {
                prop_assert_eq!(point.equity, previous);
            }
            previous = point.equity;
        }
        prop_assert_eq!(result.final_equity, previous);
    }
}

// ── 6. Permutation test ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn p_value_in_unit_interval_and_reproducible(
        moves in arb_bar_moves(30..150),
        seed in any::<u64>(),
    ) {
        let derived = derive_metrics(&build_bars(&moves));
        let test = PermutationTest::new(60, 0.05);
        let a = test.run(&derived, &mut StdRng::seed_from_u64(seed));
        let b = test.run(&derived, &mut StdRng::seed_from_u64(seed));

        prop_assert!((0.0..=1.0).contains(&a.p_value));
        prop_assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
        prop_assert_eq!(a.null_distribution.len(), b.null_distribution.len());
        for (x, y) in a.null_distribution.iter().zip(&b.null_distribution) {
            prop_assert_eq!(x.to_bits(), y.to_bits());
        }
        if a.sample_size < 50 {
            prop_assert_eq!(a.p_value, 1.0);
            prop_assert_eq!(a.observed_statistic, 0.0);
        }
    }
}
