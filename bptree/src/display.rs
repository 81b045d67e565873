//! Text dumps of the tree for debugging.

use crate::node::NodeId;
use crate::tree::RawTree;
use std::collections::VecDeque;
use std::fmt::Write;

impl RawTree {
    /// Level-order dump, one line per level.
    ///
    /// Each node prints as `[k1 k2 ...]`; a `|` separates siblings that
    /// belong to different parents.
    pub fn dump_tree(&self) -> String {
        let Some(root) = self.root else {
            return String::from("(empty)");
        };

        let mut out = String::new();
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(root, 0)]);
        let mut level = 0;
        let mut last_parent: Option<NodeId> = None;
        let mut first_on_line = true;

        while let Some((id, depth)) = queue.pop_front() {
            let node = self.node(id);
            if depth != level {
                out.push('\n');
                level = depth;
                first_on_line = true;
            }
            if !first_on_line {
                out.push_str(if node.parent() != last_parent { " | " } else { " " });
            }
            first_on_line = false;
            last_parent = node.parent();

            let keys: Vec<String> = node.keys().iter().map(ToString::to_string).collect();
            let _ = write!(out, "[{}]", keys.join(" "));

            if !node.is_leaf() {
                queue.extend(node.children().iter().map(|&child| (child, depth + 1)));
            }
        }
        out
    }

    /// The leaf chain from left to right, leaves separated by `|`.
    pub fn dump_leaves(&self) -> String {
        let mut leaves = Vec::new();
        let mut current = self.first_leaf();
        while let Some(id) = current {
            let node = self.node(id);
            let keys: Vec<String> = node.keys().iter().map(ToString::to_string).collect();
            leaves.push(keys.join(" "));
            current = node.next_leaf();
        }
        if leaves.is_empty() {
            return String::from("(empty)");
        }
        leaves.join(" | ")
    }
}
