use std::collections::BTreeMap;

use bptree::BPlusTree;
use common::{Key, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use test_case::test_case;

mod support;
use support::{assert_matches_model, init_tracing, tree_from};

const NUM_KEYS: Key = 2_000;

fn shuffled_keys(seed: u64) -> Vec<Key> {
    let mut keys: Vec<Key> = (1..=NUM_KEYS).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

#[test]
fn test_order_four_build() {
    let tree = tree_from(4, (1..=4).map(|k| (k, k)));
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.dump_tree(), "[3]\n[1 2] [3 4]");
    assert_eq!(tree.dump_leaves(), "1 2 | 3 4");
}

#[test_case(3 ; "order_3")]
#[test_case(4 ; "order_4")]
#[test_case(5 ; "order_5")]
#[test_case(8 ; "order_8")]
#[test_case(64 ; "order_64")]
#[test_case(common::DEFAULT_ORDER ; "default_order")]
fn test_round_trip_shuffled(order: usize) {
    init_tracing();
    let keys = shuffled_keys(order as u64);
    let tree = tree_from(order, keys.iter().map(|&k| (k, k * 3)));

    let model: BTreeMap<Key, Value> = keys.iter().map(|&k| (k, k * 3)).collect();
    assert_matches_model(&tree, &model);
    assert_eq!(tree.first_key(), Some(1));
    assert_eq!(tree.last_key(), Some(NUM_KEYS));
}

#[test_case(3 ; "order_3")]
#[test_case(4 ; "order_4")]
#[test_case(7 ; "order_7")]
fn test_duplicate_insert_is_ignored(order: usize) {
    let tree = tree_from(order, (0..100).map(|k| (k, k)));
    for key in 0..100 {
        assert!(!tree.insert(key, -1));
    }
    assert_eq!(tree.len(), 100);
    assert!((0..100).all(|k| tree.search(k) == Some(k)));
}

#[test_case(3 ; "order_3")]
#[test_case(4 ; "order_4")]
#[test_case(6 ; "order_6")]
fn test_delete_absent_key_is_noop(order: usize) {
    let tree = tree_from(order, (0..50).map(|k| (k * 2, k)));
    let before = tree.dump_tree();
    for key in (1..100).step_by(2) {
        assert_eq!(tree.delete(key), None);
    }
    assert_eq!(tree.dump_tree(), before);
    assert_eq!(tree.len(), 50);
}

#[test_case(3, 1 ; "order_3_seed_1")]
#[test_case(4, 2 ; "order_4_seed_2")]
#[test_case(5, 3 ; "order_5_seed_3")]
#[test_case(9, 4 ; "order_9_seed_4")]
#[test_case(128, 5 ; "order_128_seed_5")]
fn test_delete_all_then_reinsert(order: usize, seed: u64) {
    let keys = shuffled_keys(seed);
    let tree = tree_from(order, keys.iter().map(|&k| (k, k)));

    let mut model: BTreeMap<Key, Value> = keys.iter().map(|&k| (k, k)).collect();
    for (i, &key) in shuffled_keys(seed + 100).iter().enumerate() {
        assert_eq!(tree.delete(key), Some(key));
        model.remove(&key);
        if i % 97 == 0 {
            assert_matches_model(&tree, &model);
        }
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.dump_tree(), "(empty)");

    // A drained tree behaves like a fresh one.
    let fresh = BPlusTree::new(order).unwrap();
    for &key in &keys {
        assert_eq!(tree.insert(key, key), fresh.insert(key, key));
    }
    assert_eq!(tree.dump_tree(), fresh.dump_tree());
}

#[test_case(3 ; "order_3")]
#[test_case(4 ; "order_4")]
#[test_case(5 ; "order_5")]
fn test_ascending_and_descending_deletes(order: usize) {
    let tree = tree_from(order, (1..=300).map(|k| (k, k)));
    for key in 1..=150 {
        tree.delete(key);
    }
    for key in (151..=300).rev().step_by(2) {
        tree.delete(key);
    }
    let model: BTreeMap<Key, Value> = (151..=300).step_by(2).map(|k| (k, k)).collect();
    assert_matches_model(&tree, &model);
}

#[test_case(3, 11 ; "order_3")]
#[test_case(4, 12 ; "order_4")]
#[test_case(5, 13 ; "order_5")]
#[test_case(16, 14 ; "order_16")]
fn test_mixed_operations_keep_balance(order: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let tree = BPlusTree::new(order).unwrap();
    let mut model = BTreeMap::new();

    for step in 0..20_000 {
        let key = rng.gen_range(0..500);
        if rng.gen_bool(0.55) {
            let value = rng.gen::<i32>() as Value;
            let inserted = tree.insert(key, value);
            assert_eq!(inserted, !model.contains_key(&key));
            model.entry(key).or_insert(value);
        } else {
            assert_eq!(tree.delete(key), model.remove(&key));
        }
        if step % 1_000 == 0 {
            assert_matches_model(&tree, &model);
        }
    }
    assert_matches_model(&tree, &model);
}

#[test]
fn test_range_scan_bounds() {
    let tree = tree_from(4, (0..100).map(|k| (k * 10, k)));

    let scan: Vec<Key> = tree.range_scan(95, 140).map(|(k, _)| k).collect();
    assert_eq!(scan, vec![100, 110, 120, 130, 140]);

    assert_eq!(tree.range_scan(-50, -1).len(), 0);
    assert_eq!(tree.range_scan(991, 5_000).len(), 0);
    assert_eq!(tree.range_scan(500, 400).len(), 0);
    assert_eq!(tree.range_scan(Key::MIN, Key::MAX).len(), 100);
    assert_eq!(tree.range_scan(990, 990).collect::<Vec<_>>(), vec![(990, 99)]);
}

#[test]
fn test_range_scan_after_deletes() {
    let tree = tree_from(3, (1..=60).map(|k| (k, k)));
    for key in 10..=40 {
        tree.delete(key);
    }
    let scan: Vec<Key> = tree.range_scan(5, 45).map(|(k, _)| k).collect();
    let expected: Vec<Key> = (5..10).chain(41..=45).collect();
    assert_eq!(scan, expected);
}

#[test]
fn test_clear() {
    let tree = tree_from(5, (0..1_000).map(|k| (k, k)));
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.search(10), None);
    tree.check_invariants().unwrap();
    assert!(tree.insert(10, 1));
}
