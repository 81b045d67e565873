//! Insertion with leaf and internal node splits.

use crate::node::{Node, NodeId, Record};
use crate::tree::RawTree;
use common::{cut, Key, Value};
use tracing::trace;

impl RawTree {
    /// Inserts a key-value pair.
    ///
    /// Duplicates are ignored: returns `false` and keeps the existing value.
    pub fn insert(&mut self, key: Key, value: Value) -> bool {
        let record = Record { value };

        let Some(leaf) = self.find_leaf(key) else {
            self.start_new_tree(key, record);
            return true;
        };

        let node = self.arena.get_mut(leaf);
        let insertion_point = match node.keys.binary_search(&key) {
            Ok(_) => return false,
            Err(i) => i,
        };

        if node.key_count() < self.config.leaf_capacity() {
            node.keys.insert(insertion_point, key);
            node.records_mut().insert(insertion_point, record);
        } else {
            self.insert_into_leaf_after_splitting(leaf, insertion_point, key, record);
        }
        self.len += 1;
        true
    }

    fn start_new_tree(&mut self, key: Key, record: Record) {
        let root = self.arena.alloc(Node::leaf(vec![key], vec![record], None, None));
        self.root = Some(root);
        self.len = 1;
    }

    /// Splits a full leaf around the new entry.
    ///
    /// The full leaf keeps the first `cut(order - 1)` of the `order`
    /// entries; a new right sibling takes the rest and is spliced into the
    /// leaf chain after it.
    fn insert_into_leaf_after_splitting(
        &mut self,
        leaf: NodeId,
        insertion_point: usize,
        key: Key,
        record: Record,
    ) {
        let split = cut(self.config.leaf_capacity());

        let node = self.arena.get_mut(leaf);
        node.keys.insert(insertion_point, key);
        node.records_mut().insert(insertion_point, record);

        let right_keys = node.keys.split_off(split);
        let right_records = node.records_mut().split_off(split);
        let parent = node.parent;
        let next = node.next_leaf();

        let separator = right_keys[0];
        let new_leaf = self
            .arena
            .alloc(Node::leaf(right_keys, right_records, next, parent));
        self.arena.get_mut(leaf).set_next_leaf(Some(new_leaf));

        trace!(%leaf, %new_leaf, separator, "split leaf");
        self.insert_into_parent(leaf, separator, new_leaf);
    }

    /// Links `right` into the tree as the sibling after `left`, separated by `key`.
    ///
    /// Walks up the parent chain: each level either absorbs the separator or
    /// splits and pushes a new separator one level higher. Reaching the root
    /// grows the tree by one level.
    fn insert_into_parent(&mut self, mut left: NodeId, mut key: Key, mut right: NodeId) {
        loop {
            let Some(parent) = self.arena.get(left).parent else {
                self.insert_into_new_root(left, key, right);
                return;
            };

            let left_index = self.child_index(parent, left);
            let order = self.config.order();

            let node = self.arena.get_mut(parent);
            node.keys.insert(left_index, key);
            node.children_mut().insert(left_index + 1, right);

            if node.key_count() <= self.config.internal_capacity() {
                return;
            }

            // The node now holds `order` keys and `order + 1` children. The
            // left half keeps `cut(order) - 1` keys, the key after them moves
            // up, and the new right node takes the remainder.
            let split = cut(order);
            let right_keys = node.keys.split_off(split);
            let k_prime = node
                .keys
                .pop()
                .unwrap_or_else(|| panic!("internal node {parent} split with no keys"));
            let right_children = node.children_mut().split_off(split);
            let grandparent = node.parent;

            let new_node = self.arena.alloc(Node::internal(
                right_keys,
                right_children.clone(),
                grandparent,
            ));
            self.reparent(&right_children, new_node);

            trace!(node = %parent, %new_node, k_prime, "split internal node");
            left = parent;
            key = k_prime;
            right = new_node;
        }
    }

    fn insert_into_new_root(&mut self, left: NodeId, key: Key, right: NodeId) {
        let root = self
            .arena
            .alloc(Node::internal(vec![key], vec![left, right], None));
        self.reparent(&[left, right], root);
        self.root = Some(root);
        trace!(%root, key, "grew new root");
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::RawTree;
    use common::TreeConfig;

    fn tree(order: usize) -> RawTree {
        RawTree::new(TreeConfig::new(order).unwrap())
    }

    fn leaf_keys(tree: &RawTree) -> Vec<Vec<i64>> {
        let mut leaves = Vec::new();
        let mut current = tree.first_leaf();
        while let Some(id) = current {
            let node = tree.node(id);
            leaves.push(node.keys().to_vec());
            current = node.next_leaf();
        }
        leaves
    }

    #[test]
    fn test_fourth_insert_splits_leaf() {
        let mut tree = tree(4);
        for key in 1..=3 {
            assert!(tree.insert(key, key));
        }
        assert_eq!(tree.height(), 1);

        assert!(tree.insert(4, 4));
        assert_eq!(tree.height(), 2);
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.keys(), &[3]);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4]]);

        let left = root.children()[0];
        let right = root.children()[1];
        assert_eq!(tree.node(left).next_leaf(), Some(right));
        assert_eq!(tree.node(right).next_leaf(), None);
        assert_eq!(tree.node(left).parent(), tree.root());
        assert_eq!(tree.node(right).parent(), tree.root());
    }

    #[test]
    fn test_duplicate_insert_keeps_first_value() {
        let mut tree = tree(4);
        assert!(tree.insert(5, 50));
        assert!(!tree.insert(5, 99));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find(5).map(|r| r.value), Some(50));
    }

    #[test]
    fn test_split_into_middle_of_leaf() {
        let mut tree = tree(4);
        for key in [10, 30, 40, 20] {
            tree.insert(key, key);
        }
        assert_eq!(leaf_keys(&tree), vec![vec![10, 20], vec![30, 40]]);
        assert_eq!(tree.node(tree.root().unwrap()).keys(), &[30]);
    }

    #[test]
    fn test_internal_split_promotes_middle_key() {
        let mut tree = tree(4);
        for key in 1..=10 {
            tree.insert(key, key);
        }
        // Leaves: [1 2] [3 4] [5 6] [7 8] [9 10]; the five-way parent
        // splits into [3] and [7 9] around 5.
        assert_eq!(tree.height(), 3);
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.keys(), &[5]);

        let left = tree.node(root.children()[0]);
        let right = tree.node(root.children()[1]);
        assert_eq!(left.keys(), &[3]);
        assert_eq!(right.keys(), &[7, 9]);
        for &child in right.children() {
            assert_eq!(tree.node(child).parent(), Some(root.children()[1]));
        }
        assert_eq!(
            leaf_keys(&tree),
            vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![7, 8], vec![9, 10]]
        );
    }

    #[test]
    fn test_odd_order_leaf_split() {
        let mut tree = tree(5);
        for key in 1..=5 {
            tree.insert(key, key);
        }
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4, 5]]);
    }
}
