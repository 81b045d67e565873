//! Correctness checks run in test mode.
//!
//! Both checks insert a known key set, search every key back, and finish with
//! a full structural verification of the tree.

use bptree::{BPlusTree, TreeStats};
use common::{IndexError, Key, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use tracing::{error, info};

/// Keys `1..=count`, or `count` random draws from the same range.
fn key_set(count: usize, random: bool, seed: u64) -> Vec<Key> {
    let max = count as Key;
    if random {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| rng.gen_range(1..=max)).collect()
    } else {
        (1..=max).collect()
    }
}

fn verify_all_present(tree: &BPlusTree, keys: &[Key], phase: &str) -> Result<TreeStats> {
    let start = Instant::now();
    let missing = keys.iter().filter(|&&key| tree.search(key) != Some(key)).count();
    info!(phase, elapsed_us = start.elapsed().as_micros() as u64, "Search pass done");

    if missing > 0 {
        error!(phase, missing, "Keys missing after insert");
        return Err(IndexError::Corruption(format!(
            "{phase}: {missing} of {} keys not found",
            keys.len()
        )));
    }

    let distinct = keys.iter().collect::<HashSet<_>>().len();
    if tree.len() != distinct {
        return Err(IndexError::Corruption(format!(
            "{phase}: tree holds {} keys, expected {distinct}",
            tree.len()
        )));
    }
    tree.check_invariants()
}

/// Inserts `count` keys from one thread, then searches all of them.
pub fn sequential_test(
    tree: &BPlusTree,
    count: usize,
    random: bool,
    seed: u64,
) -> Result<TreeStats> {
    let keys = key_set(count, random, seed);
    info!(
        count,
        order = if random { "random" } else { "increasing" },
        "Sequential insert"
    );

    let start = Instant::now();
    for &key in &keys {
        tree.insert(key, key);
    }
    info!(elapsed_us = start.elapsed().as_micros() as u64, "Sequential insert done");

    verify_all_present(tree, &keys, "sequential")
}

/// Splits `count` keys, offset by `offset`, into one contiguous slice per
/// thread and inserts the slices concurrently. The last thread also takes
/// the remainder.
pub fn parallel_test(
    tree: Arc<BPlusTree>,
    count: usize,
    threads: usize,
    offset: Key,
    random: bool,
    seed: u64,
) -> Result<TreeStats> {
    if threads == 0 {
        return Err(IndexError::InvalidArgument(
            "at least one worker thread is required".to_string(),
        ));
    }
    let keys = key_set(count, random, seed)
        .into_iter()
        .map(|key| {
            key.checked_add(offset).ok_or_else(|| {
                IndexError::InvalidArgument(format!(
                    "key {key} offset by {offset} overflows the key type"
                ))
            })
        })
        .collect::<Result<Vec<Key>>>()?;
    let keys = Arc::new(keys);
    let share = count / threads;
    let barrier = Arc::new(Barrier::new(threads));

    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|id| {
            let tree = Arc::clone(&tree);
            let keys = Arc::clone(&keys);
            let barrier = Arc::clone(&barrier);
            let begin = share * id;
            let end = if id == threads - 1 { count } else { begin + share };

            thread::spawn(move || {
                barrier.wait();
                for &key in &keys[begin..end] {
                    tree.insert(key, key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| IndexError::Corruption("insert worker panicked".to_string()))?;
    }
    info!(threads, count, elapsed_us = start.elapsed().as_micros() as u64, "Parallel insert done");

    verify_all_present(&tree, &keys, "parallel")
}
