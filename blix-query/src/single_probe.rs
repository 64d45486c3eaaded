use blix_index::IndexTree;
use blix_result::{Error, Result};
use blix_store::{KeyBytes, KeyRange, SegmentPath, SegmentStore, ValueBytes};
use blix_threading::WorkerPool;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::context::{QueryContext, QueryOutcome, QueryTelemetry};

/// Baseline strategy: traverse only the primary column's tree, scan its
/// candidate segments for matching keys, then verify every remaining
/// column with point gets.
///
/// Trades fewer Bloom probes (one tree) for C−1 point gets per surviving
/// candidate key, which is what makes it a useful comparator for the
/// multi-column engine.
pub struct SingleIndexProbe<'a> {
    store: &'a dyn SegmentStore,
    pool: &'a WorkerPool,
}

impl<'a> SingleIndexProbe<'a> {
    pub fn new(store: &'a dyn SegmentStore, pool: &'a WorkerPool) -> Self {
        Self { store, pool }
    }

    /// Keys whose row matches `values[c]` in `columns[c]` for every
    /// column, using `primary` as the index of `columns[0]`.
    pub fn query(
        &self,
        primary: &IndexTree,
        columns: &[&str],
        values: &[ValueBytes],
    ) -> Result<QueryOutcome> {
        if columns.is_empty() || columns.len() != values.len() {
            return Err(Error::InvalidConfig(format!(
                "queried {} columns against {} values",
                columns.len(),
                values.len()
            )));
        }

        let ctx = QueryContext::new();
        let candidates = primary.query_leaf_nodes(&values[0], &KeyRange::all(), ctx.counters())?;

        // The SST counter advances by candidate count up front, before
        // any scan runs; strategy comparisons depend on this accounting.
        ctx.counters().record_sst_checks(candidates.len() as u64);

        let scans: Vec<(SegmentPath, KeyRange)> = candidates
            .iter()
            .map(|&id| {
                let node = primary.node(id);
                let segment = node.segment().map(str::to_string).ok_or_else(|| {
                    Error::Internal("leaf query returned an interior node".to_string())
                })?;
                Ok((
                    segment,
                    KeyRange::new(node.start_key.clone(), node.end_key.clone()),
                ))
            })
            .collect::<Result<_>>()?;

        let primary_value = &values[0];
        let key_lists: Vec<Vec<KeyBytes>> = self.pool.install(|| {
            scans
                .par_iter()
                .map(|(segment, leaf_range)| {
                    match self
                        .store
                        .scan_segment_for_value(segment, primary_value, leaf_range)
                    {
                        Ok(keys) => keys,
                        Err(e) => {
                            tracing::warn!("candidate scan of {segment} failed: {e}");
                            Vec::new()
                        }
                    }
                })
                .collect()
        });
        let candidate_keys: Vec<KeyBytes> = key_lists
            .into_iter()
            .flatten()
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();
        tracing::debug!(
            "single-index probe: {} candidate segments, {} candidate keys",
            candidates.len(),
            candidate_keys.len()
        );

        // Verify the remaining columns per key, in parallel. A failed
        // get disqualifies the key rather than aborting the query.
        let verified: Vec<Option<KeyBytes>> = self.pool.install(|| {
            candidate_keys
                .par_iter()
                .map(|key| {
                    for (column, expected) in columns.iter().zip(values).skip(1) {
                        match self.store.get(column, key) {
                            Ok(Some(actual)) if actual == *expected => {}
                            Ok(_) => return None,
                            Err(e) => {
                                tracing::warn!("point get in {column} failed: {e}");
                                return None;
                            }
                        }
                    }
                    Some(key.clone())
                })
                .collect()
        });

        let mut keys: Vec<KeyBytes> = verified.into_iter().flatten().collect();
        keys.sort_unstable();
        let telemetry = ctx.finish();
        tracing::debug!(
            "single-index probe matched {} keys: {} bloom probes ({} on leaves), {} sst checks, {:?}",
            keys.len(),
            telemetry.stats.bloom_probes,
            telemetry.stats.leaf_bloom_probes,
            telemetry.stats.sst_checks,
            telemetry.elapsed
        );
        Ok(QueryOutcome { keys, telemetry })
    }

    /// Does `value` occur anywhere in the indexed column within `range`?
    ///
    /// Candidate segments are scanned in parallel and the first hit
    /// wins; remaining scans are abandoned by the short-circuiting
    /// reduction.
    pub fn find_value(
        &self,
        tree: &IndexTree,
        value: &[u8],
        range: &KeyRange,
    ) -> Result<(bool, QueryTelemetry)> {
        let ctx = QueryContext::new();
        let paths = tree.query_paths(value, range, ctx.counters())?;
        ctx.counters().record_sst_checks(paths.len() as u64);

        let found = self.pool.install(|| {
            paths.par_iter().any(|segment| {
                match self
                    .store
                    .scan_segment_for_value(segment, value, &KeyRange::all())
                {
                    Ok(keys) => !keys.is_empty(),
                    Err(e) => {
                        tracing::warn!("existence scan of {segment} failed: {e}");
                        false
                    }
                }
            })
        });
        Ok((found, ctx.finish()))
    }
}
