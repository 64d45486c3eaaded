use blix_index::{IndexTree, NodeId, NodeKind};
use blix_result::{Error, Result};
use blix_store::{KeyBytes, KeyRange, SegmentPath, SegmentStore, ValueBytes};
use blix_threading::WorkerPool;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::context::{QueryContext, QueryOutcome};

/// One step of the synchronised walk: the currently selected node per
/// column plus the shared key range all of them must still intersect.
struct Combo {
    nodes: Vec<NodeId>,
    range_start: KeyBytes,
    range_end: KeyBytes,
}

/// Conjunctive query executor over one index tree per column.
///
/// The engine descends all trees simultaneously. At each level it
/// expands every column's node into range-overlapping,
/// filter-positive children, tightening the shared range between
/// columns as candidate spans shrink, then enumerates the Cartesian
/// product of candidates with backtracking. A combination whose nodes
/// are all leaves names one segment per column; those segments are
/// scanned in parallel and the per-column key sets intersected.
pub struct MultiColumnEngine<'a> {
    store: &'a dyn SegmentStore,
    pool: &'a WorkerPool,
}

impl<'a> MultiColumnEngine<'a> {
    pub fn new(store: &'a dyn SegmentStore, pool: &'a WorkerPool) -> Self {
        Self { store, pool }
    }

    /// Return every shared key whose row matches `values[c]` in column
    /// `c` for all columns, restricted to `range`.
    ///
    /// `trees` and `values` are parallel vectors. The result set is
    /// deduplicated and sorted; telemetry carries the probe counters of
    /// this invocation only.
    pub fn query(
        &self,
        trees: &[&IndexTree],
        values: &[ValueBytes],
        range: &KeyRange,
    ) -> Result<QueryOutcome> {
        if trees.is_empty() || trees.len() != values.len() {
            return Err(Error::InvalidConfig(format!(
                "queried {} trees against {} values",
                trees.len(),
                values.len()
            )));
        }

        let ctx = QueryContext::new();
        let mut matches: FxHashSet<KeyBytes> = FxHashSet::default();

        if let Some(start) = self.initial_combo(trees, values, range, &ctx)? {
            self.descend(trees, values, start, &ctx, &mut matches)?;
        }

        let mut keys: Vec<KeyBytes> = matches.into_iter().collect();
        keys.sort_unstable();
        let telemetry = ctx.finish();
        tracing::debug!(
            "multi-column query matched {} keys: {} bloom probes ({} on leaves), {} sst checks, {:?}",
            keys.len(),
            telemetry.stats.bloom_probes,
            telemetry.stats.leaf_bloom_probes,
            telemetry.stats.sst_checks,
            telemetry.elapsed
        );
        Ok(QueryOutcome { keys, telemetry })
    }

    /// Seed the walk at the roots: intersect the outer range with every
    /// root's span and probe each root once. `None` means the query is
    /// already decided empty (a tree has no leaves, or a root filter
    /// rules its value out).
    fn initial_combo(
        &self,
        trees: &[&IndexTree],
        values: &[ValueBytes],
        range: &KeyRange,
        ctx: &QueryContext,
    ) -> Result<Option<Combo>> {
        let mut roots = Vec::with_capacity(trees.len());
        for tree in trees {
            match tree.root_id()? {
                Some(root) => roots.push(root),
                None => return Ok(None),
            }
        }

        let first = trees[0].node(roots[0]);
        let mut start = match range.start() {
            Some(s) => s.to_vec(),
            None => first.start_key.clone(),
        };
        let mut end = match range.end() {
            Some(e) => e.to_vec(),
            None => first.end_key.clone(),
        };
        for (tree, &root) in trees.iter().zip(&roots) {
            let node = tree.node(root);
            if node.start_key > start {
                start = node.start_key.clone();
            }
            if node.end_key < end {
                end = node.end_key.clone();
            }
        }

        // Root filters are probed exactly once, here; the descent only
        // probes children it generates. Root probes count toward the
        // total only, whatever the root's shape.
        for (i, (tree, &root)) in trees.iter().zip(&roots).enumerate() {
            ctx.counters().record_probe(false);
            if !tree.node(root).filter.exists(&values[i]) {
                return Ok(None);
            }
        }

        Ok(Some(Combo {
            nodes: roots,
            range_start: start,
            range_end: end,
        }))
    }

    fn descend(
        &self,
        trees: &[&IndexTree],
        values: &[ValueBytes],
        combo: Combo,
        ctx: &QueryContext,
        out: &mut FxHashSet<KeyBytes>,
    ) -> Result<()> {
        if combo.range_start > combo.range_end {
            return Ok(());
        }

        let n = combo.nodes.len();
        let all_leaves = combo
            .nodes
            .iter()
            .zip(trees)
            .all(|(&id, tree)| tree.node(id).is_leaf());
        if all_leaves {
            return self.terminal_scan(trees, values, &combo, ctx, out);
        }

        // Expand candidates column by column, tightening the shared
        // range between columns so later columns prune against the
        // spans the earlier ones actually cover.
        let mut candidates: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut tight_start = combo.range_start.clone();
        let mut tight_end = combo.range_end.clone();

        for i in 0..n {
            let tree = trees[i];
            let node_id = combo.nodes[i];
            let node = tree.node(node_id);
            let mut col_min: Option<KeyBytes> = None;
            let mut col_max: Option<KeyBytes> = None;

            match &node.kind {
                NodeKind::Leaf { .. } => {
                    // Already probed when it became a candidate; only
                    // the range gates it at this level.
                    if node.end_key < tight_start || node.start_key > tight_end {
                        return Ok(());
                    }
                    candidates[i].push(node_id);
                    col_min = Some(node.start_key.clone());
                    col_max = Some(node.end_key.clone());
                }
                NodeKind::Interior { children } => {
                    for &child_id in children {
                        let child = tree.node(child_id);
                        if child.end_key < tight_start || child.start_key > tight_end {
                            continue;
                        }
                        ctx.counters().record_probe(child.is_leaf());
                        if !child.filter.exists(&values[i]) {
                            continue;
                        }
                        candidates[i].push(child_id);
                        if col_min.as_deref().is_none_or(|m| child.start_key.as_slice() < m) {
                            col_min = Some(child.start_key.clone());
                        }
                        if col_max.as_deref().is_none_or(|m| child.end_key.as_slice() > m) {
                            col_max = Some(child.end_key.clone());
                        }
                    }
                    if candidates[i].is_empty() {
                        return Ok(());
                    }
                }
            }

            if i + 1 < n {
                if let Some(m) = col_min
                    && m > tight_start
                {
                    tight_start = m;
                }
                if let Some(m) = col_max
                    && m < tight_end
                {
                    tight_end = m;
                }
                if tight_start > tight_end {
                    return Ok(());
                }
            }
        }

        // Cartesian product with backtracking. Each combination re-derives
        // its range from the combo's own bounds; the tightened range above
        // only filtered candidates.
        let mut chosen = combo.nodes.clone();
        self.backtrack(
            trees,
            values,
            &candidates,
            0,
            &mut chosen,
            combo.range_start.clone(),
            combo.range_end.clone(),
            ctx,
            out,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn backtrack(
        &self,
        trees: &[&IndexTree],
        values: &[ValueBytes],
        candidates: &[Vec<NodeId>],
        idx: usize,
        chosen: &mut Vec<NodeId>,
        cur_start: KeyBytes,
        cur_end: KeyBytes,
        ctx: &QueryContext,
        out: &mut FxHashSet<KeyBytes>,
    ) -> Result<()> {
        if idx == candidates.len() {
            let next = Combo {
                nodes: chosen.clone(),
                range_start: cur_start,
                range_end: cur_end,
            };
            return self.descend(trees, values, next, ctx, out);
        }
        for &candidate in &candidates[idx] {
            let node = trees[idx].node(candidate);
            let next_start = if node.start_key > cur_start {
                node.start_key.clone()
            } else {
                cur_start.clone()
            };
            let next_end = if node.end_key < cur_end {
                node.end_key.clone()
            } else {
                cur_end.clone()
            };
            if next_start <= next_end {
                chosen[idx] = candidate;
                self.backtrack(
                    trees, values, candidates, idx + 1, chosen, next_start, next_end, ctx, out,
                )?;
            }
        }
        Ok(())
    }

    /// All-leaves combination: scan one segment per column in parallel,
    /// each clamped to the shared range, and intersect the key sets.
    fn terminal_scan(
        &self,
        trees: &[&IndexTree],
        values: &[ValueBytes],
        combo: &Combo,
        ctx: &QueryContext,
        out: &mut FxHashSet<KeyBytes>,
    ) -> Result<()> {
        let n = combo.nodes.len();
        ctx.counters().record_sst_checks(n as u64);

        let scans: Vec<(usize, SegmentPath, KeyRange)> = (0..n)
            .map(|i| {
                let node = trees[i].node(combo.nodes[i]);
                let segment = node.segment().map(str::to_string).ok_or_else(|| {
                    Error::Internal("terminal combination holds an interior node".to_string())
                })?;
                let start = std::cmp::max(&combo.range_start, &node.start_key).clone();
                let end = std::cmp::min(&combo.range_end, &node.end_key).clone();
                Ok((i, segment, KeyRange::new(start, end)))
            })
            .collect::<Result<_>>()?;

        // A failed scan drops that column's contribution for this
        // combination only; recall may degrade, never correctness.
        let key_sets: Vec<FxHashSet<KeyBytes>> = self.pool.install(|| {
            scans
                .par_iter()
                .map(|(i, segment, scan_range)| {
                    match self
                        .store
                        .scan_segment_for_value(segment, &values[*i], scan_range)
                    {
                        Ok(keys) => keys.into_iter().collect(),
                        Err(e) => {
                            tracing::warn!("terminal scan of {segment} failed: {e}");
                            FxHashSet::default()
                        }
                    }
                })
                .collect()
        });

        let mut sets = key_sets.into_iter();
        let Some(mut survivors) = sets.next() else {
            return Ok(());
        };
        for set in sets {
            if survivors.is_empty() {
                break;
            }
            survivors.retain(|key| set.contains(key));
        }
        out.extend(survivors);
        Ok(())
    }
}
