//! Thread-safe B+ tree.
//!
//! A single reader-writer lock owned by the tree guards the whole node
//! graph. Writers hold it exclusively for the full descent, mutation and
//! rebalance; readers share it for the length of their traversal. No
//! thread ever observes a half-split or half-merged tree.

use crate::iterator::RangeScan;
use crate::tree::RawTree;
use crate::verify::TreeStats;
use common::{Key, OrderedIndex, Result, TreeConfig, Value};
use parking_lot::RwLock;

/// A B+ tree index supporting concurrent point queries, range scans,
/// inserts and deletes.
#[derive(Debug)]
pub struct BPlusTree {
    inner: RwLock<RawTree>,
}

impl BPlusTree {
    /// Creates an empty tree with the given order.
    ///
    /// Fails if `order` is outside `MIN_ORDER..=MAX_ORDER`.
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::with_config(TreeConfig::new(order)?))
    }

    /// Creates an empty tree from a validated configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            inner: RwLock::new(RawTree::new(config)),
        }
    }

    /// Wraps an existing unsynchronized tree.
    pub fn from_raw(tree: RawTree) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    /// Unwraps the tree, consuming the lock.
    pub fn into_raw(self) -> RawTree {
        self.inner.into_inner()
    }

    /// The order (maximum fan-out) fixed at construction.
    pub fn order(&self) -> usize {
        self.inner.read().config().order()
    }

    /// Inserts a key-value pair.
    ///
    /// Returns `false` without touching the stored value if the key exists.
    pub fn insert(&self, key: Key, value: Value) -> bool {
        self.inner.write().insert(key, value)
    }

    /// Searches for a key, returning its value if present.
    pub fn search(&self, key: Key) -> Option<Value> {
        self.inner.read().find(key).map(|record| record.value)
    }

    /// Returns `true` if `key` is stored.
    pub fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    /// Snapshots every pair with `lo <= key <= hi`, in key order.
    ///
    /// Empty when `lo > hi`.
    pub fn range_scan(&self, lo: Key, hi: Key) -> RangeScan {
        let tree = self.inner.read();
        RangeScan::new(tree.range(lo, hi).collect())
    }

    /// Snapshots the whole tree in key order.
    pub fn iter(&self) -> RangeScan {
        self.range_scan(Key::MIN, Key::MAX)
    }

    /// Removes a key, returning the value it held.
    pub fn delete(&self, key: Key) -> Option<Value> {
        self.inner.write().delete(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Number of levels: 0 when empty, 1 for a lone leaf.
    pub fn height(&self) -> usize {
        self.inner.read().height()
    }

    pub fn first_key(&self) -> Option<Key> {
        self.inner.read().first_key()
    }

    pub fn last_key(&self) -> Option<Key> {
        self.inner.read().last_key()
    }

    /// Verifies every structural invariant and reports the tree's shape.
    pub fn check_invariants(&self) -> Result<TreeStats> {
        self.inner.read().check_invariants()
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Level-order dump of the node keys.
    pub fn dump_tree(&self) -> String {
        self.inner.read().dump_tree()
    }

    /// The leaf chain, left to right.
    pub fn dump_leaves(&self) -> String {
        self.inner.read().dump_leaves()
    }
}

impl Default for BPlusTree {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl OrderedIndex for BPlusTree {
    fn name(&self) -> &str {
        "BPlusTree"
    }

    fn insert(&self, key: Key, value: Value) -> bool {
        BPlusTree::insert(self, key, value)
    }

    fn search(&self, key: Key) -> Option<Value> {
        BPlusTree::search(self, key)
    }

    fn range_scan(&self, lo: Key, hi: Key) -> Vec<(Key, Value)> {
        BPlusTree::range_scan(self, lo, hi).collect()
    }

    fn delete(&self, key: Key) -> Option<Value> {
        BPlusTree::delete(self, key)
    }

    fn len(&self) -> usize {
        BPlusTree::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IndexError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_bptree_create_and_search() {
        let tree = BPlusTree::new(4).unwrap();

        // Search in empty tree
        assert_eq!(tree.search(42), None);
        assert_eq!(tree.height(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_bptree_simple_insert_and_search() {
        let tree = BPlusTree::new(4).unwrap();

        assert!(tree.insert(10, 100));
        assert_eq!(tree.search(10), Some(100));
        assert_eq!(tree.search(20), None);
        assert!(tree.contains(10));
    }

    #[test]
    fn test_bptree_rejects_bad_order() {
        assert!(matches!(
            BPlusTree::new(2),
            Err(IndexError::InvalidOrder { order: 2, .. })
        ));
    }

    #[test]
    fn test_default_order() {
        let tree = BPlusTree::default();
        assert_eq!(tree.order(), common::DEFAULT_ORDER);
    }

    #[test]
    fn test_range_scan_is_snapshot() {
        let tree = BPlusTree::new(4).unwrap();
        for key in 1..=10 {
            tree.insert(key, key * 2);
        }
        let scan = tree.range_scan(3, 6);
        tree.delete(4);
        tree.insert(5, 0);
        assert_eq!(scan.collect::<Vec<_>>(), vec![(3, 6), (4, 8), (5, 10), (6, 12)]);
        assert_eq!(tree.range_scan(6, 3).len(), 0);
    }

    #[test]
    fn test_raw_tree_round_trip() {
        let mut raw = RawTree::new(TreeConfig::new(4).unwrap());
        for key in 1..=6 {
            raw.insert(key, key * 10);
        }
        let tree = BPlusTree::from_raw(raw);
        assert_eq!(tree.search(6), Some(60));
        assert!(tree.insert(7, 70));

        let raw = tree.into_raw();
        assert_eq!(raw.len(), 7);
        assert_eq!(raw.find(7).map(|r| r.value), Some(70));
        raw.check_invariants().unwrap();
    }

    #[test]
    fn test_trait_object_dispatch() {
        let index: Arc<dyn OrderedIndex> = Arc::new(BPlusTree::new(3).unwrap());
        assert!(index.insert(1, 11));
        assert!(!index.insert(1, 12));
        assert_eq!(index.search(1), Some(11));
        assert_eq!(index.range_scan(0, 5), vec![(1, 11)]);
        assert_eq!(index.delete(1), Some(11));
        assert!(index.is_empty());
        assert_eq!(index.name(), "BPlusTree");
    }

    #[test]
    fn test_multithreaded_disjoint_inserts() {
        let tree = Arc::new(BPlusTree::new(5).unwrap());
        let num_threads = 4;
        let per_thread = 250;

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let key = (i * num_threads + t) as Key;
                        assert!(tree.insert(key, key));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), num_threads * per_thread);
        let keys: Vec<Key> = tree.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, (0..(num_threads * per_thread) as Key).collect::<Vec<_>>());
        tree.check_invariants().unwrap();
    }
}
