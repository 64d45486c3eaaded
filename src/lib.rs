//! blix: hierarchical Bloom-filter indexing for column-partitioned LSM
//! stores.
//!
//! This crate is the entrypoint for the blix workspace. It re-exports
//! the member crates so applications see one surface for building
//! per-column filter hierarchies and running conjunctive lookups over
//! them.
//!
//! # What blix Does
//!
//! Records in the backing store share one key space and several named
//! attribute columns, each materialised as an ordered family of
//! immutable sorted segment files. blix answers multi-attribute
//! exact-match lookups — "which keys carry value V_c in every queried
//! column c" — without scanning the store: each column gets a
//! [`IndexTree`], a branching-R hierarchy whose leaves Bloom-summarise
//! fixed-size partitions of one segment and whose interior nodes union
//! their children's filters while enclosing their key ranges.
//!
//! # Crate Topology
//!
//! - [`blix_store`] defines the [`SegmentStore`] contract the index
//!   consumes (segment enumeration, forward iteration, value scans,
//!   point gets) and ships [`MemStore`], the in-memory reference
//!   implementation.
//! - [`blix_bloom`] implements the [`BloomFilter`] with its persisted
//!   little-endian format and the false-positive sizing math.
//! - [`blix_index`] builds and queries the per-column trees:
//!   [`IndexBuilder`] scans segments in parallel on the shared
//!   [`WorkerPool`], [`IndexTree`] serves range-pruned candidate
//!   lookups once built.
//! - [`blix_query`] executes queries: [`MultiColumnEngine`] walks one
//!   tree per column in lock-step under a shared key range and
//!   intersects parallel terminal scans; [`SingleIndexProbe`] walks
//!   only the primary tree and verifies other columns by point gets.
//!   Both report [`ProbeStats`] telemetry per invocation.
//! - [`blix_result`] and [`blix_threading`] supply the unified error
//!   type and the injected worker-pool handle.
//!
//! # Example
//!
//! ```no_run
//! use blix::{
//!     IndexBuilder, IndexConfig, KeyRange, MemStore, MultiColumnEngine, WorkerPool,
//! };
//!
//! fn main() -> blix::Result<()> {
//!     let store = MemStore::open("/tmp/blixdb", &["phone", "mail"])?;
//!     // ... load and flush rows ...
//!
//!     let pool = WorkerPool::new()?;
//!     let builder = IndexBuilder::new(IndexConfig::default(), pool.clone())?;
//!     let trees = builder.build_for_columns(&store, &["phone", "mail"])?;
//!
//!     let engine = MultiColumnEngine::new(&store, &pool);
//!     let outcome = engine.query(
//!         &trees.iter().map(|(_, t)| t).collect::<Vec<_>>(),
//!         &[b"phone_value42".to_vec(), b"mail_value42".to_vec()],
//!         &KeyRange::all(),
//!     )?;
//!     println!(
//!         "{} keys, {} bloom probes",
//!         outcome.keys.len(),
//!         outcome.telemetry.stats.bloom_probes
//!     );
//!     Ok(())
//! }
//! ```

pub use blix_bloom::{self as bloom, BloomFilter, bits_for, false_positive_rate, hashes_for};
pub use blix_index::{
    self as index, IndexBuilder, IndexConfig, IndexNode, IndexTree, NodeId, NodeKind,
    ProbeCounters, ProbeStats, leaf_filter_path, persist_leaf_filters,
};
pub use blix_query::{
    self as query, MultiColumnEngine, QueryContext, QueryOutcome, QueryTelemetry,
    SingleIndexProbe, full_scan_match,
};
pub use blix_result::{Error, Result};
pub use blix_store::{
    self as store, KeyBytes, KeyRange, MemStore, SegmentPath, SegmentStore, ValueBytes,
};
pub use blix_threading::WorkerPool;
