//! B+ tree node and node arena.
//!
//! Nodes live in a slot vector owned by the tree and refer to each other by
//! [`NodeId`]. Parent links and the leaf chain are plain ids, so the cyclic
//! node graph never needs shared ownership.

use common::{Key, Value};
use std::fmt;

/// Stable handle to a node slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The payload stored for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub value: Value,
}

/// Variant-specific part of a node.
#[derive(Debug)]
pub enum NodeKind {
    /// `keys.len() + 1` children; child `i` holds keys in `[keys[i-1], keys[i])`.
    Internal { children: Vec<NodeId> },
    /// One record per key, plus the link to the next leaf in key order.
    Leaf {
        records: Vec<Record>,
        next: Option<NodeId>,
    },
}

/// A B+ tree node: sorted keys plus children or records.
#[derive(Debug)]
pub struct Node {
    pub(crate) keys: Vec<Key>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    /// Creates a leaf holding the given entries.
    pub fn leaf(
        keys: Vec<Key>,
        records: Vec<Record>,
        next: Option<NodeId>,
        parent: Option<NodeId>,
    ) -> Self {
        debug_assert_eq!(keys.len(), records.len());
        Self {
            keys,
            parent,
            kind: NodeKind::Leaf { records, next },
        }
    }

    /// Creates an internal node over the given children.
    pub fn internal(keys: Vec<Key>, children: Vec<NodeId>, parent: Option<NodeId>) -> Self {
        debug_assert_eq!(keys.len() + 1, children.len());
        Self {
            keys,
            parent,
            kind: NodeKind::Internal { children },
        }
    }

    /// Returns whether this node is a leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Returns the number of keys in this node.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the sorted keys of this node.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns the parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children of an internal node.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf { .. } => panic!("children() called on leaf node"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf { .. } => panic!("children_mut() called on leaf node"),
        }
    }

    /// Returns the records of a leaf node.
    pub fn records(&self) -> &[Record] {
        match &self.kind {
            NodeKind::Leaf { records, .. } => records,
            NodeKind::Internal { .. } => panic!("records() called on internal node"),
        }
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        match &mut self.kind {
            NodeKind::Leaf { records, .. } => records,
            NodeKind::Internal { .. } => panic!("records_mut() called on internal node"),
        }
    }

    /// Returns the next leaf in key order (only valid for leaf nodes).
    pub fn next_leaf(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Leaf { next, .. } => *next,
            NodeKind::Internal { .. } => panic!("next_leaf() called on internal node"),
        }
    }

    /// Sets the next leaf (only valid for leaf nodes).
    pub(crate) fn set_next_leaf(&mut self, leaf: Option<NodeId>) {
        match &mut self.kind {
            NodeKind::Leaf { next, .. } => *next = leaf,
            NodeKind::Internal { .. } => panic!("set_next_leaf() called on internal node"),
        }
    }

    /// Child slot to descend into for `key`. Ties go right.
    pub fn child_slot(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }
}

/// Owner of every node in a tree.
///
/// Freed slots go on a free list and are handed out again by [`alloc`].
/// Touching a freed slot is a bug in the tree and panics.
///
/// [`alloc`]: NodeArena::alloc
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node` and returns its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Removes the node from the arena and returns it.
    pub fn free(&mut self, id: NodeId) -> Node {
        let node = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("double free of node {id}"));
        self.free.push(id.0);
        node
    }

    pub fn get(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling node {id}"),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling node {id}"),
        }
    }

    /// Borrows two distinct nodes mutably at once.
    pub fn pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut Node, &mut Node) {
        assert_ne!(a, b, "pair_mut() called with the same node twice");
        let (low, high, swapped) = if a.0 < b.0 { (a, b, false) } else { (b, a, true) };
        let (head, tail) = self.slots.split_at_mut(high.0);
        let low_node = head[low.0]
            .as_mut()
            .unwrap_or_else(|| panic!("dangling node {low}"));
        let high_node = tail[0]
            .as_mut()
            .unwrap_or_else(|| panic!("dangling node {high}"));
        if swapped {
            (high_node, low_node)
        } else {
            (low_node, high_node)
        }
    }

    /// Number of live nodes.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
