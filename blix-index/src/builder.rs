use std::time::Instant;

use blix_bloom::BloomFilter;
use blix_result::Result;
use blix_store::{KeyBytes, SegmentPath, SegmentStore};
use blix_threading::WorkerPool;
use rayon::prelude::*;

use crate::config::IndexConfig;
use crate::persist::persist_leaf_filters;
use crate::tree::IndexTree;

/// Stateless factory turning a column's segment files into an
/// [`IndexTree`].
///
/// Segments are scanned concurrently on the shared worker pool, each
/// task owning its running filter; leaves are concatenated in
/// segment-path order before the interior levels are grouped
/// sequentially. A segment that cannot be opened contributes no leaves
/// (logged), so queries simply never reach it through the index.
pub struct IndexBuilder {
    config: IndexConfig,
    pool: WorkerPool,
}

/// Leaf produced by a segment scan, before the tree takes ownership.
struct PartitionLeaf {
    filter: BloomFilter,
    segment: SegmentPath,
    start_key: KeyBytes,
    end_key: KeyBytes,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig, pool: WorkerPool) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, pool })
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build the index tree for one column from its ordered segment
    /// list, then persist the leaf filters beside their segments.
    pub fn build_for_column(
        &self,
        store: &dyn SegmentStore,
        segments: &[SegmentPath],
    ) -> Result<IndexTree> {
        let started = Instant::now();

        // Indexed par_iter keeps the per-segment leaf batches in input
        // order, so the concatenated leaf list matches segment order.
        let batches: Vec<Vec<PartitionLeaf>> = self.pool.install(|| {
            segments
                .par_iter()
                .map(|segment| match self.scan_segment(store, segment) {
                    Ok(leaves) => leaves,
                    Err(e) => {
                        tracing::warn!("skipping segment {segment}: {e}");
                        Vec::new()
                    }
                })
                .collect()
        });

        let mut tree = IndexTree::new(self.config.clone())?;
        for leaf in batches.into_iter().flatten() {
            tree.add_leaf(leaf.filter, leaf.segment, leaf.start_key, leaf.end_key)?;
        }
        tree.build()?;

        let persisted = persist_leaf_filters(&tree);
        tracing::debug!(
            "built index over {} segments: {} leaves, {} nodes, {persisted} filters persisted, {:?}",
            segments.len(),
            tree.leaves().len(),
            tree.node_count(),
            started.elapsed()
        );
        Ok(tree)
    }

    /// Build one tree per column, concurrently across columns on the
    /// shared pool. Results keep the input column order.
    pub fn build_for_columns(
        &self,
        store: &dyn SegmentStore,
        columns: &[&str],
    ) -> Result<Vec<(String, IndexTree)>> {
        self.pool.install(|| {
            columns
                .par_iter()
                .map(|column| {
                    let segments = store.enumerate_segments(column)?;
                    let tree = self.build_for_column(store, &segments)?;
                    Ok(((*column).to_string(), tree))
                })
                .collect()
        })
    }

    /// Scan one segment into partition leaves: a running filter absorbs
    /// values until `partition_size` entries have passed, then the run
    /// is sealed with its first and last key and a fresh filter starts.
    /// The final run may be short.
    fn scan_segment(
        &self,
        store: &dyn SegmentStore,
        segment: &str,
    ) -> Result<Vec<PartitionLeaf>> {
        let entries = store.iterate(segment)?;

        let mut leaves = Vec::new();
        let mut filter = self.fresh_filter()?;
        let mut start_key: Option<KeyBytes> = None;
        let mut last_key: KeyBytes = KeyBytes::new();
        let mut count = 0usize;

        for (key, value) in entries {
            if start_key.is_none() {
                start_key = Some(key.clone());
            }
            filter.insert(&value);
            last_key = key;
            count += 1;

            if count >= self.config.partition_size
                && let Some(start) = start_key.take()
            {
                leaves.push(PartitionLeaf {
                    filter: std::mem::replace(&mut filter, self.fresh_filter()?),
                    segment: segment.to_string(),
                    start_key: start,
                    end_key: last_key.clone(),
                });
                count = 0;
            }
        }

        if count > 0
            && let Some(start) = start_key.take()
        {
            leaves.push(PartitionLeaf {
                filter,
                segment: segment.to_string(),
                start_key: start,
                end_key: last_key,
            });
        }

        Ok(leaves)
    }

    fn fresh_filter(&self) -> Result<BloomFilter> {
        BloomFilter::new(self.config.filter_bits, self.config.hash_count)
    }
}
