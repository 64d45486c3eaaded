use blix_result::Result;

use crate::key_range::KeyRange;
use crate::types::{KeyBytes, SegmentPath, ValueBytes};

/// Read-side contract of the sorted-segment store the index runs against.
///
/// Implementations must be thread-safe: the builder iterates several
/// segments concurrently and the query engines dispatch scans and point
/// gets from worker threads. Each call hands out its own iterator or
/// result buffer; no shared cursor state.
pub trait SegmentStore: Send + Sync {
    /// Ordered list of sealed segment paths for `column`. The order must
    /// match the key-range order of the segments.
    fn enumerate_segments(&self, column: &str) -> Result<Vec<SegmentPath>>;

    /// Forward iterator over a segment's `(key, value)` pairs in
    /// key-ascending order until exhausted.
    fn iterate(&self, segment: &str)
    -> Result<Box<dyn Iterator<Item = (KeyBytes, ValueBytes)> + Send>>;

    /// Keys inside `range` whose value in this segment equals `value`,
    /// in key-ascending order.
    fn scan_segment_for_value(
        &self,
        segment: &str,
        value: &[u8],
        range: &KeyRange,
    ) -> Result<Vec<KeyBytes>>;

    /// Point lookup of `key` in `column`; `None` when absent.
    fn get(&self, column: &str, key: &[u8]) -> Result<Option<ValueBytes>>;
}
