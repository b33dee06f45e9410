//! Deterministic RNG hierarchy.
//!
//! A master seed yields one sub-seed per `(symbol, stream)` pair via BLAKE3.
//! Derivation does not depend on the order in which symbols are processed, so
//! a batch produces identical per-symbol results whether it runs sequentially
//! or in parallel.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Independent random streams used during one symbol's analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RngStream {
    MonteCarlo,
    Bootstrap,
}

impl RngStream {
    fn tag(self) -> &'static [u8] {
        match self {
            RngStream::MonteCarlo => b"monte_carlo",
            RngStream::Bootstrap => b"bootstrap",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Deterministic sub-seed for a `(symbol, stream)` pair.
    pub fn sub_seed(&self, symbol: &str, stream: RngStream) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(&[0]);
        hasher.update(stream.tag());
        let hash = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }

    pub fn rng_for(&self, symbol: &str, stream: RngStream) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol, stream))
    }
}
