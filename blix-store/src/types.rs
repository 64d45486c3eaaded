/// Row key bytes; ordering is byte-lexicographic throughout.
pub type KeyBytes = Vec<u8>;

/// Column value bytes; no internal structure is assumed.
pub type ValueBytes = Vec<u8>;

/// Identifier of one immutable sorted segment file.
pub type SegmentPath = String;
