//! Unsynchronized B+ tree core.
//!
//! [`RawTree`] owns the node arena and implements search here; insertion
//! and deletion live in `insert.rs` and `delete.rs`. Mutations take
//! `&mut self`, so a caller that shares a tree across threads must wrap it
//! in a lock (see [`crate::BPlusTree`]).

use crate::iterator::LeafCursor;
use crate::node::{Node, NodeArena, NodeId, Record};
use common::{Key, TreeConfig};

/// A B+ tree without internal locking.
#[derive(Debug)]
pub struct RawTree {
    pub(crate) config: TreeConfig,
    pub(crate) root: Option<NodeId>,
    pub(crate) arena: NodeArena,
    pub(crate) len: usize,
}

impl RawTree {
    /// Creates an empty tree.
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            arena: NodeArena::new(),
            len: 0,
        }
    }

    /// Returns the tree configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns the root node, `None` for an empty tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels: 0 when empty, 1 for a lone leaf.
    pub fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return height;
            }
            current = node.children()[0];
            height += 1;
        }
    }

    /// Descends from the root to the leaf that would hold `key`.
    pub fn find_leaf(&self, key: Key) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return Some(current);
            }
            current = node.children()[node.child_slot(key)];
        }
    }

    /// Returns the record stored under `key`.
    pub fn find(&self, key: Key) -> Option<&Record> {
        let leaf = self.arena.get(self.find_leaf(key)?);
        let index = leaf.keys.binary_search(&key).ok()?;
        Some(&leaf.records()[index])
    }

    /// Leftmost leaf, the head of the leaf chain.
    pub fn first_leaf(&self) -> Option<NodeId> {
        self.edge_leaf(|children| children[0])
    }

    /// Rightmost leaf, the tail of the leaf chain.
    pub fn last_leaf(&self) -> Option<NodeId> {
        self.edge_leaf(|children| children[children.len() - 1])
    }

    fn edge_leaf(&self, pick: impl Fn(&[NodeId]) -> NodeId) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return Some(current);
            }
            current = pick(node.children());
        }
    }

    /// Smallest stored key.
    pub fn first_key(&self) -> Option<Key> {
        let leaf = self.arena.get(self.first_leaf()?);
        leaf.keys.first().copied()
    }

    /// Largest stored key.
    pub fn last_key(&self) -> Option<Key> {
        let leaf = self.arena.get(self.last_leaf()?);
        leaf.keys.last().copied()
    }

    /// Walks the leaf chain over every key in `[lo, hi]`.
    pub fn range(&self, lo: Key, hi: Key) -> LeafCursor<'_> {
        if lo > hi {
            return LeafCursor::empty(self);
        }
        match self.find_leaf(lo) {
            Some(leaf) => {
                let start = self.arena.get(leaf).keys.partition_point(|&k| k < lo);
                LeafCursor::new(self, leaf, start, hi)
            }
            None => LeafCursor::empty(self),
        }
    }

    /// Drops every node and record.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Position of `child` in `parent`'s child array.
    ///
    /// # Panics
    /// Panics if `child` is not a child of `parent`; the tree is corrupt.
    pub(crate) fn child_index(&self, parent: NodeId, child: NodeId) -> usize {
        self.arena
            .get(parent)
            .children()
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("node {child} not found in parent {parent}"))
    }

    /// Points every listed child back at `parent`.
    pub(crate) fn reparent(&mut self, children: &[NodeId], parent: NodeId) {
        for &child in children {
            self.arena.get_mut(child).parent = Some(parent);
        }
    }
}
