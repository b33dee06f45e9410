//! Bootstrap confidence intervals for the gap thresholds.
//!
//! Resamples the full-history overnight gaps with replacement and recomputes
//! the floored threshold for every confidence level on each resample. The
//! 5th/95th percentiles of those thresholds form a 90% interval around the
//! full-sample point estimate.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::domain::DerivedBar;
use crate::stats::{quantile, quantile_sorted};
use crate::threshold::threshold_pct_from_quantile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdInterval {
    pub confidence: f64,
    /// Threshold (percent) on the full sample.
    pub point_estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBootstrap {
    /// Empty when fewer than `min_sample_size` gaps are defined.
    pub intervals: Vec<ThresholdInterval>,
    pub n_resamples: usize,
    pub sample_size: usize,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub n_resamples: usize,
    pub min_sample_size: usize,
    pub confidence_levels: Vec<f64>,
}

impl BootstrapConfig {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            n_resamples: config.n_bootstrap,
            min_sample_size: config.min_sample_size,
            confidence_levels: config.confidence_levels.clone(),
        }
    }
}

pub fn bootstrap_thresholds<R: Rng + ?Sized>(
    derived: &[DerivedBar],
    config: &BootstrapConfig,
    rng: &mut R,
) -> ThresholdBootstrap {
    let gaps: Vec<f64> = derived
        .iter()
        .filter_map(|d| d.overnight_gap)
        .filter(|g| g.is_finite())
        .collect();
    let n = gaps.len();

    if n < config.min_sample_size || n == 0 || config.n_resamples == 0 {
        return ThresholdBootstrap {
            intervals: Vec::new(),
            n_resamples: 0,
            sample_size: n,
        };
    }

    let levels = &config.confidence_levels;
    let mut per_level: Vec<Vec<f64>> = vec![Vec::with_capacity(config.n_resamples); levels.len()];
    let mut resample = vec![0.0; n];

    for _ in 0..config.n_resamples {
        for slot in resample.iter_mut() {
            *slot = gaps[rng.gen_range(0..n)];
        }
        resample.sort_by(f64::total_cmp);
        for (k, &c) in levels.iter().enumerate() {
            if let Some(q) = quantile_sorted(&resample, 1.0 - c) {
                per_level[k].push(threshold_pct_from_quantile(q));
            }
        }
    }

    let intervals = levels
        .iter()
        .zip(per_level.iter_mut())
        .filter_map(|(&confidence, samples)| {
            samples.sort_by(f64::total_cmp);
            let point = quantile(&gaps, 1.0 - confidence)?;
            Some(ThresholdInterval {
                confidence,
                point_estimate: threshold_pct_from_quantile(point),
                ci_lower: quantile_sorted(samples, 0.05)?,
                ci_upper: quantile_sorted(samples, 0.95)?,
            })
        })
        .collect();

    ThresholdBootstrap {
        intervals,
        n_resamples: config.n_resamples,
        sample_size: n,
    }
}
