//! Deletion with coalesce and redistribute.
//!
//! After an entry leaves a node, the node is checked against its minimum
//! occupancy. An underfull node either merges with an adjacent sibling
//! (which removes one separator from the parent, so the check repeats one
//! level up) or borrows a single entry from that sibling. Merging is
//! preferred whenever the combined node fits.

use crate::node::NodeId;
use crate::tree::RawTree;
use common::{Key, Value};
use tracing::trace;

/// Which sibling an underfull node is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Neighbor {
    /// The sibling to the left, at this child slot of the parent.
    Left(usize),
    /// The node is its parent's leftmost child; pair with child slot 1.
    Right,
}

impl RawTree {
    /// Removes `key`, returning the value it held.
    ///
    /// Absent keys leave the tree untouched.
    pub fn delete(&mut self, key: Key) -> Option<Value> {
        let leaf = self.find_leaf(key)?;
        let node = self.arena.get_mut(leaf);
        let index = node.keys.binary_search(&key).ok()?;

        node.keys.remove(index);
        let record = node.records_mut().remove(index);
        self.len -= 1;

        self.rebalance(leaf);
        Some(record.value)
    }

    /// Restores occupancy bounds from `node` upward after a removal.
    fn rebalance(&mut self, mut node: NodeId) {
        loop {
            if Some(node) == self.root {
                self.adjust_root();
                return;
            }

            let current = self.arena.get(node);
            let is_leaf = current.is_leaf();
            let min_keys = if is_leaf {
                self.config.min_leaf_keys()
            } else {
                self.config.min_internal_keys()
            };
            if current.key_count() >= min_keys {
                return;
            }

            let parent = current
                .parent
                .unwrap_or_else(|| panic!("non-root node {node} has no parent"));
            let neighbor_slot = match self.child_index(parent, node) {
                0 => Neighbor::Right,
                index => Neighbor::Left(index - 1),
            };
            let k_prime_index = match neighbor_slot {
                Neighbor::Left(index) => index,
                Neighbor::Right => 0,
            };

            let parent_node = self.arena.get(parent);
            let k_prime = parent_node.keys[k_prime_index];
            let neighbor = match neighbor_slot {
                Neighbor::Left(index) => parent_node.children()[index],
                Neighbor::Right => parent_node.children()[1],
            };

            // Leaves merge their entries as-is; internal nodes also absorb
            // the separator, which costs one more slot.
            let capacity = if is_leaf {
                self.config.order()
            } else {
                self.config.order() - 1
            };
            let combined = self.arena.get(neighbor).key_count() + self.arena.get(node).key_count();

            if combined < capacity {
                let (left, right) = match neighbor_slot {
                    Neighbor::Left(_) => (neighbor, node),
                    Neighbor::Right => (node, neighbor),
                };
                self.coalesce_nodes(left, right, k_prime);

                let parent_node = self.arena.get_mut(parent);
                parent_node.keys.remove(k_prime_index);
                parent_node.children_mut().remove(k_prime_index + 1);
                node = parent;
            } else {
                self.redistribute_nodes(
                    node,
                    neighbor,
                    neighbor_slot,
                    parent,
                    k_prime_index,
                    k_prime,
                );
                return;
            }
        }
    }

    /// Collapses an empty root.
    ///
    /// An empty internal root hands the tree to its only child; an empty
    /// leaf root leaves the tree empty.
    fn adjust_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let node = self.arena.get(root);
        if node.key_count() > 0 {
            return;
        }

        if node.is_leaf() {
            self.arena.free(root);
            self.root = None;
            trace!(%root, "tree emptied");
        } else {
            let child = node.children()[0];
            self.arena.free(root);
            self.arena.get_mut(child).parent = None;
            self.root = Some(child);
            trace!(old_root = %root, new_root = %child, "collapsed root");
        }
    }

    /// Appends every entry of `right` to `left` and frees `right`.
    ///
    /// The caller removes `k_prime` and the pointer to `right` from the parent.
    fn coalesce_nodes(&mut self, left: NodeId, right: NodeId, k_prime: Key) {
        let mut absorbed = self.arena.free(right);
        let target = self.arena.get_mut(left);

        if target.is_leaf() {
            target.keys.append(&mut absorbed.keys);
            target.records_mut().append(absorbed.records_mut());
            target.set_next_leaf(absorbed.next_leaf());
        } else {
            let moved = std::mem::take(absorbed.children_mut());
            target.keys.push(k_prime);
            target.keys.append(&mut absorbed.keys);
            target.children_mut().extend_from_slice(&moved);
            self.reparent(&moved, left);
        }
        trace!(%left, %right, k_prime, "coalesced nodes");
    }

    /// Moves one entry from `neighbor` into the underfull `node` and updates
    /// the separator between them.
    fn redistribute_nodes(
        &mut self,
        node: NodeId,
        neighbor: NodeId,
        neighbor_slot: Neighbor,
        parent: NodeId,
        k_prime_index: usize,
        k_prime: Key,
    ) {
        let (target, source) = self.arena.pair_mut(node, neighbor);
        let is_leaf = target.is_leaf();

        let (new_separator, moved_child) = match (neighbor_slot, is_leaf) {
            // Pull the left neighbor's last entry to the front of `node`.
            (Neighbor::Left(_), true) => {
                let key = source.keys.pop().unwrap_or_else(|| panic!("empty neighbor {neighbor}"));
                let record = source
                    .records_mut()
                    .pop()
                    .unwrap_or_else(|| panic!("empty neighbor {neighbor}"));
                target.keys.insert(0, key);
                target.records_mut().insert(0, record);
                (key, None)
            }
            (Neighbor::Left(_), false) => {
                let key = source.keys.pop().unwrap_or_else(|| panic!("empty neighbor {neighbor}"));
                let child = source
                    .children_mut()
                    .pop()
                    .unwrap_or_else(|| panic!("childless neighbor {neighbor}"));
                target.keys.insert(0, k_prime);
                target.children_mut().insert(0, child);
                (key, Some(child))
            }
            // Pull the right neighbor's first entry to the back of `node`.
            (Neighbor::Right, true) => {
                let key = source.keys.remove(0);
                let record = source.records_mut().remove(0);
                target.keys.push(key);
                target.records_mut().push(record);
                (source.keys[0], None)
            }
            (Neighbor::Right, false) => {
                let key = source.keys.remove(0);
                let child = source.children_mut().remove(0);
                target.keys.push(k_prime);
                target.children_mut().push(child);
                (key, Some(child))
            }
        };

        if let Some(child) = moved_child {
            self.arena.get_mut(child).parent = Some(node);
        }
        self.arena.get_mut(parent).keys[k_prime_index] = new_separator;
        trace!(%node, %neighbor, new_separator, "redistributed entry");
    }
}
