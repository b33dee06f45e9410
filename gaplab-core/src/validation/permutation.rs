//! Permutation test for the gap / recovery association.
//!
//! Observed statistic: Pearson correlation between overnight gap and the
//! recovery indicator (as 0/1). Null distribution: the same correlation with
//! the recovery column shuffled. Two-sided p-value over the null.
//!
//! The random source is passed in by the caller; a fixed seed reproduces the
//! null distribution and p-value exactly.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::domain::DerivedBar;
use crate::stats::pearson;

/// Fewer paired observations than this yields the degenerate result.
pub const MIN_PAIRED_OBSERVATIONS: usize = 50;

/// How the result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Null distribution built and compared against the observed statistic.
    Tested,
    /// Fewer than `MIN_PAIRED_OBSERVATIONS` pairs.
    InsufficientData,
    /// Correlation undefined (zero variance), or every permutation was skipped.
    DegenerateStatistic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub observed_statistic: f64,
    pub null_distribution: Vec<f64>,
    /// Always within [0, 1].
    pub p_value: f64,
    pub significant: bool,
    pub status: ValidationStatus,
    pub sample_size: usize,
    /// Permutations whose correlation was undefined and therefore dropped.
    pub skipped_permutations: usize,
}

impl MonteCarloResult {
    /// `p_value = 1.0`, statistic 0.0, not significant.
    pub fn degenerate(status: ValidationStatus, sample_size: usize) -> Self {
        Self {
            observed_statistic: 0.0,
            null_distribution: Vec::new(),
            p_value: 1.0,
            significant: false,
            status,
            sample_size,
            skipped_permutations: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermutationTest {
    n_permutations: usize,
    significance_level: f64,
}

impl PermutationTest {
    pub fn new(n_permutations: usize, significance_level: f64) -> Self {
        Self {
            n_permutations,
            significance_level,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.n_monte_carlo, config.significance_level)
    }

    pub fn run<R: Rng + ?Sized>(&self, derived: &[DerivedBar], rng: &mut R) -> MonteCarloResult {
        let (gaps, recovery) = paired_sample(derived);
        let n = gaps.len();

        if n < MIN_PAIRED_OBSERVATIONS {
            debug!(pairs = n, "too few paired observations for permutation test");
            return MonteCarloResult::degenerate(ValidationStatus::InsufficientData, n);
        }

        let observed = pearson(&gaps, &recovery);

        let mut null_distribution = Vec::with_capacity(self.n_permutations);
        let mut skipped = 0;
        let mut shuffled = recovery.clone();
        for _ in 0..self.n_permutations {
            shuffled.copy_from_slice(&recovery);
            shuffled.shuffle(rng);
            match pearson(&gaps, &shuffled) {
                Some(r) => null_distribution.push(r),
                None => skipped += 1,
            }
        }

        let observed = match observed {
            Some(r) if !null_distribution.is_empty() => r,
            _ => {
                warn!(
                    pairs = n,
                    skipped, "correlation undefined; permutation test degenerate"
                );
                let mut result =
                    MonteCarloResult::degenerate(ValidationStatus::DegenerateStatistic, n);
                result.observed_statistic = observed.unwrap_or(0.0);
                result.null_distribution = null_distribution;
                result.skipped_permutations = skipped;
                return result;
            }
        };

        let extreme = null_distribution
            .iter()
            .filter(|r| r.abs() >= observed.abs())
            .count();
        let p_value = extreme as f64 / null_distribution.len() as f64;

        debug!(
            pairs = n,
            observed, p_value, skipped, "permutation test complete"
        );

        MonteCarloResult {
            observed_statistic: observed,
            null_distribution,
            p_value,
            significant: p_value < self.significance_level,
            status: ValidationStatus::Tested,
            sample_size: n,
            skipped_permutations: skipped,
        }
    }
}

/// Rows with both a defined gap and a defined recovery indicator.
fn paired_sample(derived: &[DerivedBar]) -> (Vec<f64>, Vec<f64>) {
    derived
        .iter()
        .filter_map(|d| match (d.overnight_gap, d.recovery_indicator) {
            (Some(gap), Some(rec)) if gap.is_finite() => Some((gap, if rec { 1.0 } else { 0.0 })),
            _ => None,
        })
        .unzip()
}
