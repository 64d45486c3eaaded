use crate::error::Error;

/// Result type alias used throughout blix.
pub type Result<T> = std::result::Result<T, Error>;
