//! Hierarchical Bloom index trees.
//!
//! One [`IndexTree`] summarises one attribute column: each leaf carries a
//! Bloom filter over a contiguous run of entries from one segment file,
//! and interior nodes union their children's filters while enclosing
//! their key ranges. Queries descend from the root, pruning subtrees
//! whose key range misses the constraint or whose filter rules the value
//! out, and return candidate segments in segment order.
//!
//! [`IndexBuilder`] produces trees: segments are scanned in parallel on
//! the shared worker pool, leaves are concatenated in segment order, and
//! interior levels are grouped bottom-up with branching ratio R. After a
//! build, leaf filters persist beside their segment files; interior
//! filters stay in memory and are rebuilt with the tree.

pub mod builder;
pub mod config;
pub mod node;
pub mod persist;
pub mod probes;
pub mod tree;

pub use builder::IndexBuilder;
pub use config::IndexConfig;
pub use node::{IndexNode, NodeId, NodeKind};
pub use persist::{leaf_filter_path, persist_leaf_filters};
pub use probes::{ProbeCounters, ProbeStats};
pub use tree::IndexTree;
