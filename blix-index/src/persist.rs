use std::path::PathBuf;

use crate::tree::IndexTree;

/// Sidecar path of a leaf's persisted filter:
/// `<segment_path>_<startKey>_<endKey>`.
///
/// Keys are byte strings; non-UTF-8 bytes are rendered lossily, which is
/// stable for any given key and keeps the path printable.
pub fn leaf_filter_path(segment: &str, start_key: &[u8], end_key: &[u8]) -> PathBuf {
    PathBuf::from(format!(
        "{segment}_{}_{}",
        String::from_utf8_lossy(start_key),
        String::from_utf8_lossy(end_key)
    ))
}

/// Write every leaf filter of `tree` beside its segment file.
///
/// Interior filters are memory-only and rebuilt with the tree; the leaf
/// sidecars are the only index state that survives between runs. A
/// failed write is logged and skipped so one bad path does not abort the
/// build. Returns the number of filters written.
pub fn persist_leaf_filters(tree: &IndexTree) -> usize {
    let mut written = 0usize;
    for &id in tree.leaves() {
        let node = tree.node(id);
        let Some(segment) = node.segment() else {
            continue;
        };
        let path = leaf_filter_path(segment, &node.start_key, &node.end_key);
        match node.filter.save_to(&path) {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!("failed to persist leaf filter {}: {e}", path.display());
            }
        }
    }
    written
}
