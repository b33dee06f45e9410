//! Randomized validation: permutation significance test and threshold bootstrap.

pub mod bootstrap;
pub mod permutation;

pub use bootstrap::{bootstrap_thresholds, BootstrapConfig, ThresholdBootstrap, ThresholdInterval};
pub use permutation::{
    MonteCarloResult, PermutationTest, ValidationStatus, MIN_PAIRED_OBSERVATIONS,
};
