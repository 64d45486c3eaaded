//! Bloom filters for blix index nodes.
//!
//! Every node of an index tree carries one [`BloomFilter`] over the values
//! beneath it; all filters in a tree share one width and probe count so
//! parents can be formed by bitwise union. False positives are possible,
//! false negatives are not.
//!
//! Leaf filters persist in a fixed little-endian layout (see
//! [`BloomFilter::serialize`]); interior filters live in memory only and
//! are rebuilt with the tree.

pub mod filter;
pub mod sizing;

pub use filter::BloomFilter;
pub use sizing::{bits_for, false_positive_rate, hashes_for};
