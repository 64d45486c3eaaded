use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all blix operations.
///
/// Errors propagate upward through the call stack using Rust's `?`
/// operator. [`Error::Io`] is the only recoverable kind: build and query
/// code catches it at the boundary of the worker task that produced it,
/// logs, and drops that task's contribution. Every other variant aborts
/// the current top-level operation.
///
/// `Error` is `Send + Sync` so worker results can cross thread boundaries.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during segment iteration, scans, or filter persistence.
    ///
    /// During an index build a failed segment open yields an empty leaf
    /// list for that segment; during a query a failed scan drops that
    /// scan's contribution and may silently reduce recall.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Impossible construction parameters.
    ///
    /// Raised for a zero filter width, zero hash count, a branching
    /// ratio below 2, a zero partition size, or a column/value arity
    /// mismatch handed to a query. Fatal; fix the caller.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Attempt to union Bloom filters of differing bit widths.
    ///
    /// Filters only union within one tree, and every node of a tree
    /// shares one width, so this is a programming error.
    #[error("bloom filter width mismatch: expected {expected} bits, got {actual}")]
    FilterSizeMismatch { expected: u64, actual: u64 },

    /// Operation issued against a tree in the wrong lifecycle state.
    ///
    /// Querying before `build`, building twice, or appending leaves to a
    /// finished tree. Fatal; fix the caller.
    #[error("index lifecycle violation: {0}")]
    Lifecycle(String),

    /// A named column or segment is unknown to the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal error indicating a bug or violated invariant.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::InvalidConfig`] from any displayable value.
    #[inline]
    pub fn invalid_config<E: fmt::Display>(err: E) -> Self {
        Error::InvalidConfig(err.to_string())
    }

    /// Create an [`Error::Lifecycle`] from any displayable value.
    #[inline]
    pub fn lifecycle<E: fmt::Display>(err: E) -> Self {
        Error::Lifecycle(err.to_string())
    }
}
