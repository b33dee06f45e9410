//! Chronological train / validation / test split.
//!
//! The split is a reporting view over one full-history backtest: thresholds
//! and trades are computed once on the whole series, then each trade is
//! attributed to the segment that contains its exit bar.

use gaplab_core::domain::Trade;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Train,
    Validation,
    Test,
}

/// Contiguous bar index ranges covering `0..n_bars` without overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub train: Range<usize>,
    pub validation: Range<usize>,
    pub test: Range<usize>,
}

impl SplitPlan {
    /// Train gets `floor(n * train)` bars, validation `floor(n * validation)`,
    /// test the remainder. The test ratio is implied by the other two.
    pub fn from_ratios(n_bars: usize, train: f64, validation: f64, _test: f64) -> Self {
        let n_train = segment_len(n_bars, train).min(n_bars);
        let n_val = segment_len(n_bars, validation).min(n_bars - n_train);
        let val_end = n_train + n_val;
        Self {
            train: 0..n_train,
            validation: n_train..val_end,
            test: val_end..n_bars,
        }
    }

    pub fn segment_of(&self, bar_index: usize) -> Option<Segment> {
        if self.train.contains(&bar_index) {
            Some(Segment::Train)
        } else if self.validation.contains(&bar_index) {
            Some(Segment::Validation)
        } else if self.test.contains(&bar_index) {
            Some(Segment::Test)
        } else {
            None
        }
    }

    pub fn range(&self, segment: Segment) -> &Range<usize> {
        match segment {
            Segment::Train => &self.train,
            Segment::Validation => &self.validation,
            Segment::Test => &self.test,
        }
    }
}

/// `floor(n * ratio)`, tolerant of ratios like 0.7 that sit just below their decimal value.
fn segment_len(n_bars: usize, ratio: f64) -> usize {
    (n_bars as f64 * ratio + 1e-9).floor().max(0.0) as usize
}

/// Per-segment trade outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub segment: Segment,
    pub start_index: usize,
    pub end_index: usize,
    pub bars: usize,
    pub trades: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitReport {
    pub segments: Vec<SegmentReport>,
}

impl SplitReport {
    pub fn build(plan: &SplitPlan, trades: &[Trade]) -> Self {
        let segments = [Segment::Train, Segment::Validation, Segment::Test]
            .into_iter()
            .map(|segment| {
                let range = plan.range(segment);
                let (count, pnl) = trades
                    .iter()
                    .filter(|t| range.contains(&t.exit_index))
                    .fold((0usize, 0.0_f64), |(n, p), t| (n + 1, p + t.pnl));
                SegmentReport {
                    segment,
                    start_index: range.start,
                    end_index: range.end,
                    bars: range.len(),
                    trades: count,
                    pnl,
                }
            })
            .collect();
        Self { segments }
    }

    pub fn get(&self, segment: Segment) -> Option<&SegmentReport> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn trade(entry: usize, exit: usize, pnl: f64) -> Trade {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Trade {
            entry_index: entry,
            entry_date: d + chrono::Duration::days(entry as i64),
            entry_price: 100.0,
            exit_index: exit,
            exit_date: d + chrono::Duration::days(exit as i64),
            exit_price: 100.0 + pnl / 100.0,
            shares: 100,
            pnl,
        }
    }

    #[test]
    fn default_ratios_on_100_bars() {
        let plan = SplitPlan::from_ratios(100, 0.7, 0.15, 0.15);
        assert_eq!(plan.train, 0..70);
        assert_eq!(plan.validation, 70..85);
        assert_eq!(plan.test, 85..100);
    }

    #[test]
    fn remainder_goes_to_test() {
        let plan = SplitPlan::from_ratios(101, 0.7, 0.15, 0.15);
        assert_eq!(plan.train, 0..70);
        assert_eq!(plan.validation, 70..85);
        assert_eq!(plan.test, 85..101);
    }

    #[test]
    fn empty_series() {
        let plan = SplitPlan::from_ratios(0, 0.7, 0.15, 0.15);
        assert!(plan.train.is_empty() && plan.validation.is_empty() && plan.test.is_empty());
    }

    #[test]
    fn trades_attributed_by_exit_bar() {
        let plan = SplitPlan::from_ratios(100, 0.7, 0.15, 0.15);
        let trades = vec![trade(10, 20, 50.0), trade(65, 72, 30.0), trade(90, 95, 10.0)];
        let report = SplitReport::build(&plan, &trades);

        let train = report.get(Segment::Train).unwrap();
        assert_eq!(train.trades, 1);
        assert_eq!(train.pnl, 50.0);
        let val = report.get(Segment::Validation).unwrap();
        assert_eq!(val.trades, 1);
        assert_eq!(val.pnl, 30.0);
        let test = report.get(Segment::Test).unwrap();
        assert_eq!(test.trades, 1);
        assert_eq!(test.bars, 15);
    }

    proptest! {
        #[test]
        fn ranges_partition_all_bars(
            n in 0usize..5_000,
            train in 0.0..1.0_f64,
            frac in 0.0..1.0_f64,
        ) {
            let validation = (1.0 - train) * frac;
            let test = 1.0 - train - validation;
            let plan = SplitPlan::from_ratios(n, train, validation, test);
            prop_assert_eq!(plan.train.start, 0);
            prop_assert_eq!(plan.train.end, plan.validation.start);
            prop_assert_eq!(plan.validation.end, plan.test.start);
            prop_assert_eq!(plan.test.end, n);
            for i in (0..n).step_by(97) {
                prop_assert!(plan.segment_of(i).is_some());
            }
            prop_assert!(plan.segment_of(n).is_none());
        }
    }
}
