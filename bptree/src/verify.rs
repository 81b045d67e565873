//! Structural verification and occupancy statistics.

use crate::node::NodeId;
use crate::tree::RawTree;
use common::{IndexError, Key, Result};
use std::ops::Bound;

/// Shape summary produced by [`RawTree::check_invariants`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of levels, 0 for an empty tree.
    pub height: usize,
    pub internal_nodes: usize,
    pub leaf_nodes: usize,
    pub keys: usize,
    /// Fewest keys in any leaf.
    pub min_leaf_fill: usize,
    /// Most keys in any leaf.
    pub max_leaf_fill: usize,
}

fn corrupt(message: String) -> IndexError {
    IndexError::Corruption(message)
}

impl RawTree {
    /// Walks the whole tree and checks every structural invariant.
    ///
    /// Verifies per-node key order and occupancy, separator bounds,
    /// child/parent links, equal leaf depth, and that the leaf chain visits
    /// exactly the leaves reachable from the root, in key order.
    pub fn check_invariants(&self) -> Result<TreeStats> {
        let Some(root) = self.root else {
            if self.len != 0 {
                return Err(corrupt(format!("empty tree reports {} keys", self.len)));
            }
            return Ok(TreeStats::default());
        };
        if let Some(parent) = self.node(root).parent() {
            return Err(corrupt(format!("root {root} has parent {parent}")));
        }

        let mut walk = Walk {
            leaves: Vec::new(),
            leaf_depth: None,
            stats: TreeStats {
                min_leaf_fill: usize::MAX,
                ..TreeStats::default()
            },
        };
        self.check_subtree(root, 1, Bound::Unbounded, Bound::Unbounded, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        let mut stats = walk.stats;
        stats.height = walk.leaf_depth.unwrap_or(0);
        if stats.keys != self.len {
            return Err(corrupt(format!(
                "leaves hold {} keys but the tree reports {}",
                stats.keys, self.len
            )));
        }
        let live = self.arena.live();
        if live != stats.internal_nodes + stats.leaf_nodes {
            return Err(corrupt(format!(
                "{live} live nodes but only {} reachable",
                stats.internal_nodes + stats.leaf_nodes
            )));
        }
        Ok(stats)
    }

    fn check_subtree(
        &self,
        id: NodeId,
        depth: usize,
        lower: Bound<Key>,
        upper: Bound<Key>,
        walk: &mut Walk,
    ) -> Result<()> {
        let node = self.node(id);
        let keys = node.keys();
        let is_root = Some(id) == self.root;

        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(corrupt(format!(
                "node {id} keys not strictly increasing: {keys:?}"
            )));
        }
        if let (Some(&first), Bound::Included(low)) = (keys.first(), lower) {
            if first < low {
                return Err(corrupt(format!(
                    "node {id} key {first} below separator {low}"
                )));
            }
        }
        if let (Some(&last), Bound::Excluded(high)) = (keys.last(), upper) {
            if last >= high {
                return Err(corrupt(format!(
                    "node {id} key {last} not below separator {high}"
                )));
            }
        }

        let (capacity, min_keys) = if node.is_leaf() {
            (self.config.leaf_capacity(), self.config.min_leaf_keys())
        } else {
            (self.config.internal_capacity(), self.config.min_internal_keys())
        };
        if keys.len() > capacity {
            return Err(corrupt(format!(
                "node {id} holds {} keys, capacity {capacity}",
                keys.len()
            )));
        }
        if !is_root && keys.len() < min_keys {
            return Err(corrupt(format!(
                "node {id} holds {} keys, minimum {min_keys}",
                keys.len()
            )));
        }
        if is_root && keys.is_empty() {
            return Err(corrupt(format!("root {id} is empty")));
        }

        if node.is_leaf() {
            if node.records().len() != keys.len() {
                return Err(corrupt(format!(
                    "leaf {id} has {} records for {} keys",
                    node.records().len(),
                    keys.len()
                )));
            }
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(corrupt(format!(
                        "leaf {id} at depth {depth}, expected {expected}"
                    )));
                }
                Some(_) => {}
            }
            walk.leaves.push(id);
            walk.stats.leaf_nodes += 1;
            walk.stats.keys += keys.len();
            walk.stats.min_leaf_fill = walk.stats.min_leaf_fill.min(keys.len());
            walk.stats.max_leaf_fill = walk.stats.max_leaf_fill.max(keys.len());
            return Ok(());
        }

        let children = node.children();
        if children.len() != keys.len() + 1 {
            return Err(corrupt(format!(
                "internal node {id} has {} children for {} keys",
                children.len(),
                keys.len()
            )));
        }
        walk.stats.internal_nodes += 1;

        for (slot, &child) in children.iter().enumerate() {
            if self.node(child).parent() != Some(id) {
                return Err(corrupt(format!(
                    "child {child} of {id} points to parent {:?}",
                    self.node(child).parent()
                )));
            }
            let child_lower = if slot == 0 {
                lower
            } else {
                Bound::Included(keys[slot - 1])
            };
            let child_upper = if slot == keys.len() {
                upper
            } else {
                Bound::Excluded(keys[slot])
            };
            self.check_subtree(child, depth + 1, child_lower, child_upper, walk)?;
        }
        Ok(())
    }

    fn check_leaf_chain(&self, leaves: &[NodeId]) -> Result<()> {
        let mut current = self.first_leaf();
        let mut previous_key: Option<Key> = None;

        for &expected in leaves {
            let Some(id) = current else {
                return Err(corrupt(format!("leaf chain ends before leaf {expected}")));
            };
            if id != expected {
                return Err(corrupt(format!("leaf chain visits {id}, expected {expected}")));
            }
            let node = self.node(id);
            for &key in node.keys() {
                if previous_key.is_some_and(|prev| prev >= key) {
                    return Err(corrupt(format!("leaf chain out of order at key {key}")));
                }
                previous_key = Some(key);
            }
            current = node.next_leaf();
        }

        match current {
            Some(extra) => Err(corrupt(format!(
                "leaf chain continues to unreachable leaf {extra}"
            ))),
            None => Ok(()),
        }
    }
}

struct Walk {
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    stats: TreeStats,
}
