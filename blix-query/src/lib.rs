//! Query execution over hierarchical Bloom index trees.
//!
//! Two strategies answer the same question — which shared keys match one
//! target value per column:
//!
//! - [`MultiColumnEngine`] walks one index tree per column in lock-step,
//!   narrowing a shared key range as it descends and finishing with
//!   parallel per-segment scans whose key sets are intersected.
//! - [`SingleIndexProbe`] traverses only the first column's tree, scans
//!   the candidate segments for matching keys, and verifies the other
//!   columns by point gets.
//!
//! Both return a [`QueryOutcome`]: the deduplicated, sorted key set plus
//! the query's probe counters and wall time. [`full_scan_match`] is the
//! index-free baseline used to cross-check either strategy.

pub mod baseline;
pub mod context;
pub mod multi_column;
pub mod single_probe;

pub use baseline::full_scan_match;
pub use context::{QueryContext, QueryOutcome, QueryTelemetry};
pub use multi_column::MultiColumnEngine;
pub use single_probe::SingleIndexProbe;

pub use blix_index::ProbeStats;
