//! Range scans over the leaf chain.
//!
//! [`LeafCursor`] borrows a tree and follows leaf links lazily.
//! [`RangeScan`] is the owned snapshot handed out by [`crate::BPlusTree`],
//! collected while the read lock is held.

use crate::node::NodeId;
use crate::tree::RawTree;
use common::{Key, Value};

/// A borrowing iterator over `(key, value)` pairs in key order.
///
/// The cursor follows the leaf chain, returning pairs until the end key is
/// passed or the end of the tree is reached.
pub struct LeafCursor<'a> {
    tree: &'a RawTree,
    current_leaf: Option<NodeId>,
    current_index: usize,
    end_key: Key,
}

impl<'a> LeafCursor<'a> {
    /// Creates a cursor at `start_index` of `start_leaf`, stopping after `end_key` (inclusive).
    pub fn new(tree: &'a RawTree, start_leaf: NodeId, start_index: usize, end_key: Key) -> Self {
        Self {
            tree,
            current_leaf: Some(start_leaf),
            current_index: start_index,
            end_key,
        }
    }

    /// Creates an exhausted cursor.
    pub fn empty(tree: &'a RawTree) -> Self {
        Self {
            tree,
            current_leaf: None,
            current_index: 0,
            end_key: Key::MIN,
        }
    }
}

impl Iterator for LeafCursor<'_> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = self.tree.node(self.current_leaf?);

            // The leaf is exhausted; a later leaf may still hold keys in range.
            if self.current_index >= leaf.key_count() {
                self.current_leaf = leaf.next_leaf();
                self.current_index = 0;
                continue;
            }

            let key = leaf.keys()[self.current_index];
            if key > self.end_key {
                self.current_leaf = None;
                return None;
            }

            let value = leaf.records()[self.current_index].value;
            self.current_index += 1;
            return Some((key, value));
        }
    }
}

/// An owned, ordered snapshot of the pairs in a key range.
///
/// Taken at call time; later writes to the tree are not reflected.
#[derive(Debug, Clone, Default)]
pub struct RangeScan {
    entries: std::vec::IntoIter<(Key, Value)>,
}

impl RangeScan {
    pub(crate) fn new(entries: Vec<(Key, Value)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    /// The pairs not yet consumed.
    pub fn as_slice(&self) -> &[(Key, Value)] {
        self.entries.as_slice()
    }
}

impl Iterator for RangeScan {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl DoubleEndedIterator for RangeScan {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl ExactSizeIterator for RangeScan {}
