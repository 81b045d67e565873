//! Tree configuration.
//!
//! The order (maximum fan-out of an internal node) is fixed when a tree is
//! built. Every capacity and occupancy bound used by splits and merges is
//! derived from it here, once.

use crate::error::{IndexError, Result};
use tracing::warn;

/// Smallest order for which the split and merge arithmetic is well-formed.
pub const MIN_ORDER: usize = 3;

/// Largest supported order.
pub const MAX_ORDER: usize = 400;

/// Order used when none is given.
pub const DEFAULT_ORDER: usize = 336;

/// Split point for a sequence of `length` entries: half, rounded up.
pub fn cut(length: usize) -> usize {
    if length % 2 == 0 {
        length / 2
    } else {
        length / 2 + 1
    }
}

/// Validated, immutable tree shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    order: usize,
}

impl TreeConfig {
    /// Creates a configuration for the given order.
    ///
    /// Fails with [`IndexError::InvalidOrder`] unless
    /// `MIN_ORDER <= order <= MAX_ORDER`.
    pub fn new(order: usize) -> Result<Self> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            warn!(order, "rejecting tree order");
            return Err(IndexError::InvalidOrder {
                order,
                min: MIN_ORDER,
                max: MAX_ORDER,
            });
        }
        Ok(Self { order })
    }

    /// Maximum number of children of an internal node.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum number of keys in a leaf.
    pub fn leaf_capacity(&self) -> usize {
        self.order - 1
    }

    /// Maximum number of keys in an internal node.
    pub fn internal_capacity(&self) -> usize {
        self.order - 1
    }

    /// Minimum number of keys in a non-root leaf.
    pub fn min_leaf_keys(&self) -> usize {
        cut(self.order - 1)
    }

    /// Minimum number of keys in a non-root internal node.
    pub fn min_internal_keys(&self) -> usize {
        cut(self.order) - 1
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}
