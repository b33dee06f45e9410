//! Expanding-window quantile over strictly prior observations.
//!
//! Observations are kept in an ascending buffer; each insert is a binary
//! search plus a shift, and each query reads order statistics directly. The
//! buffer is exactly what sorting the whole window would produce, so queries
//! match `stats::quantile` over the same observations bit-for-bit.

use crate::stats::quantile_sorted;

#[derive(Debug, Clone, Default)]
pub struct ExpandingQuantile {
    sorted: Vec<f64>,
}

impl ExpandingQuantile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sorted: Vec::with_capacity(capacity),
        }
    }

    /// Add one observation. Non-finite values are ignored.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let idx = self.sorted.partition_point(|&v| v.total_cmp(&value).is_le());
        self.sorted.insert(idx, value);
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn quantile(&self, q: f64) -> Option<f64> {
        quantile_sorted(&self.sorted, q)
    }

    pub fn as_sorted(&self) -> &[f64] {
        &self.sorted
    }
}
