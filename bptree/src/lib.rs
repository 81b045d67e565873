//! In-memory concurrent B+ tree index.
//!
//! This crate provides an ordered `i64 -> i64` index with:
//! - Leaf and internal node splits on insert
//! - Coalesce/redistribute rebalancing on delete
//! - Inclusive range scans via the leaf chain
//! - One reader-writer lock per tree for concurrent access
//!
//! ```
//! use bptree::BPlusTree;
//!
//! let tree = BPlusTree::new(4)?;
//! for key in 1..=4 {
//!     tree.insert(key, key * 10);
//! }
//! assert_eq!(tree.search(3), Some(30));
//! assert_eq!(tree.range_scan(2, 3).collect::<Vec<_>>(), vec![(2, 20), (3, 30)]);
//! # Ok::<(), common::IndexError>(())
//! ```

pub mod bptree;
mod delete;
mod display;
mod insert;
pub mod iterator;
pub mod node;
pub mod tree;
pub mod verify;

// Re-export main types
pub use bptree::BPlusTree;
pub use iterator::{LeafCursor, RangeScan};
pub use node::{Node, NodeId, Record};
pub use tree::RawTree;
pub use verify::TreeStats;
