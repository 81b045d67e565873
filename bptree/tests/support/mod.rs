//! Helpers shared by the integration suites.

#![allow(dead_code)]

use bptree::BPlusTree;
use common::{Key, Value};
use std::collections::BTreeMap;

/// Routes tree trace events to the test output when `RUST_LOG` asks for them.
pub fn init_tracing() {
    common::logging::init_tracing();
}

/// Builds a tree of the given order from `(key, value)` pairs.
pub fn tree_from(order: usize, pairs: impl IntoIterator<Item = (Key, Value)>) -> BPlusTree {
    let tree = BPlusTree::new(order).unwrap();
    for (key, value) in pairs {
        tree.insert(key, value);
    }
    tree
}

/// Asserts that `tree` holds exactly the contents of `model` and is well formed.
pub fn assert_matches_model(tree: &BPlusTree, model: &BTreeMap<Key, Value>) {
    let stats = tree
        .check_invariants()
        .unwrap_or_else(|e| panic!("{e}\n{}", tree.dump_tree()));
    assert_eq!(stats.keys, model.len());
    assert_eq!(tree.len(), model.len());

    let scanned: Vec<(Key, Value)> = tree.iter().collect();
    let expected: Vec<(Key, Value)> = model.iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(scanned, expected);

    for (&key, &value) in model {
        assert_eq!(tree.search(key), Some(value), "key {key}");
    }
}
