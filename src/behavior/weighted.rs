//! Reusable weighted-random choice over (item, weight) pairs.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::error::{Result, TrafficError};

/// A fixed table of items with relative weights. Construction validates the
/// weights once; sampling never fails afterwards.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T> WeightedTable<T> {
    /// Build a table from (item, weight) pairs. Empty tables, negative
    /// weights, and all-zero weights are configuration errors.
    pub fn new(entries: Vec<(T, f64)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(TrafficError::Config("weighted table is empty".to_string()));
        }
        let (items, weights): (Vec<T>, Vec<f64>) = entries.into_iter().unzip();
        let index = WeightedIndex::new(&weights)
            .map_err(|e| TrafficError::Config(format!("invalid weights: {}", e)))?;
        Ok(Self { items, index })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> &T {
        &self.items[self.index.sample(rng)]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
