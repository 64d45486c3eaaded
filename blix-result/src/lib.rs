//! Error types and result definitions for the blix index stack.
//!
//! All blix crates share a single error enum ([`Error`]) and the
//! [`Result<T>`] alias. Failures propagate upward with the `?` operator;
//! recoverable I/O faults are caught at task boundaries (a segment scan, a
//! leaf-filter write) while everything else aborts the enclosing top-level
//! operation.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
