use blix_bloom::BloomFilter;
use blix_result::{Error, Result};
use blix_store::{KeyBytes, KeyRange, SegmentPath};

use crate::config::IndexConfig;
use crate::node::{IndexNode, NodeId, NodeKind};
use crate::probes::ProbeCounters;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TreeState {
    /// Leaves may be appended; `build` has not run.
    Building,
    /// `build` has run exactly once; read-only from here on.
    Ready,
}

/// Branching-R hierarchy of Bloom-filtered nodes covering one column.
///
/// Nodes live in a tree-local arena; children are referenced by
/// [`NodeId`], so dropping the tree releases everything at once and
/// traversal never chases owning pointers.
///
/// Lifecycle: leaves are appended while the tree is BUILDING, `build`
/// runs exactly once, and the READY tree serves concurrent queries with
/// no further mutation. Violations are surfaced as
/// [`Error::Lifecycle`].
pub struct IndexTree {
    config: IndexConfig,
    nodes: Vec<IndexNode>,
    leaves: Vec<NodeId>,
    root: Option<NodeId>,
    state: TreeState,
}

impl IndexTree {
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: Vec::new(),
            leaves: Vec::new(),
            root: None,
            state: TreeState::Building,
        })
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == TreeState::Ready
    }

    fn ensure_ready(&self, operation: &str) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Error::Lifecycle(format!(
                "{operation} requires a built index tree"
            )))
        }
    }

    /// Borrow a node by id. Ids come from this tree's own accessors, so
    /// an out-of-range id is a caller bug and panics.
    #[inline]
    pub fn node(&self, id: NodeId) -> &IndexNode {
        &self.nodes[id.index()]
    }

    /// Leaf ids in segment order (the order leaves were appended).
    #[inline]
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root id of a built tree; `None` when the tree indexed no leaves.
    pub fn root_id(&self) -> Result<Option<NodeId>> {
        self.ensure_ready("root access")?;
        Ok(self.root)
    }

    /// Append one leaf summarising a partition of `segment` spanning
    /// `[start_key, end_key]`. Only valid while BUILDING.
    pub fn add_leaf(
        &mut self,
        filter: BloomFilter,
        segment: SegmentPath,
        start_key: KeyBytes,
        end_key: KeyBytes,
    ) -> Result<NodeId> {
        if self.state != TreeState::Building {
            return Err(Error::Lifecycle(
                "leaf appended to a built index tree".to_string(),
            ));
        }
        if filter.m_bits() != self.config.filter_bits {
            return Err(Error::FilterSizeMismatch {
                expected: self.config.filter_bits,
                actual: filter.m_bits(),
            });
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(IndexNode {
            filter,
            start_key,
            end_key,
            kind: NodeKind::Leaf { segment },
        });
        self.leaves.push(id);
        Ok(id)
    }

    /// Group the leaf list into interior levels bottom-up until a single
    /// root remains. Runs exactly once; a leafless tree becomes READY
    /// with no root and answers every query with an empty result.
    pub fn build(&mut self) -> Result<()> {
        if self.state != TreeState::Building {
            return Err(Error::Lifecycle(
                "index tree built twice".to_string(),
            ));
        }

        let mut level: Vec<NodeId> = self.leaves.clone();
        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len().div_ceil(self.config.branching));
            for group in level.chunks(self.config.branching) {
                parents.push(self.emit_parent(group)?);
            }
            level = parents;
        }
        self.root = level.first().copied();
        self.state = TreeState::Ready;
        Ok(())
    }

    fn emit_parent(&mut self, children: &[NodeId]) -> Result<NodeId> {
        let mut filter = BloomFilter::new(self.config.filter_bits, self.config.hash_count)?;
        let mut start_key: Option<KeyBytes> = None;
        let mut end_key: Option<KeyBytes> = None;
        for &child in children {
            let node = &self.nodes[child.index()];
            filter.union_in_place(&node.filter)?;
            if start_key.as_deref().is_none_or(|s| node.start_key.as_slice() < s) {
                start_key = Some(node.start_key.clone());
            }
            if end_key.as_deref().is_none_or(|e| node.end_key.as_slice() > e) {
                end_key = Some(node.end_key.clone());
            }
        }
        let (Some(start_key), Some(end_key)) = (start_key, end_key) else {
            return Err(Error::Internal(
                "interior node grouped zero children".to_string(),
            ));
        };
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(IndexNode {
            filter,
            start_key,
            end_key,
            kind: NodeKind::Interior {
                children: children.to_vec(),
            },
        });
        Ok(id)
    }

    /// Candidate segment paths that may hold `value` within `range`, in
    /// segment order.
    pub fn query_paths(
        &self,
        value: &[u8],
        range: &KeyRange,
        counters: &ProbeCounters,
    ) -> Result<Vec<SegmentPath>> {
        let leaves = self.query_leaf_nodes(value, range, counters)?;
        Ok(leaves
            .into_iter()
            .filter_map(|id| self.node(id).segment().map(str::to_string))
            .collect())
    }

    /// The same candidate set as [`IndexTree::query_paths`], expressed as
    /// leaf ids so callers can narrow scans to each leaf's own range.
    pub fn query_leaf_nodes(
        &self,
        value: &[u8],
        range: &KeyRange,
        counters: &ProbeCounters,
    ) -> Result<Vec<NodeId>> {
        self.ensure_ready("query")?;
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.search(root, value, range, counters, &mut out);
        }
        Ok(out)
    }

    fn search(
        &self,
        id: NodeId,
        value: &[u8],
        range: &KeyRange,
        counters: &ProbeCounters,
        out: &mut Vec<NodeId>,
    ) {
        let node = &self.nodes[id.index()];
        if !range.overlaps(&node.start_key, &node.end_key) {
            return;
        }
        counters.record_probe(node.is_leaf());
        if !node.filter.exists(value) {
            return;
        }
        match &node.kind {
            NodeKind::Leaf { .. } => out.push(id),
            NodeKind::Interior { children } => {
                for &child in children {
                    self.search(child, value, range, counters, out);
                }
            }
        }
    }

    /// Serialized bytes of the memory-resident interior filters.
    pub fn interior_filter_bytes(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.filter.serialized_len())
            .sum()
    }

    /// Serialized bytes of the leaf filters persisted beside segments.
    pub fn leaf_filter_bytes(&self) -> usize {
        self.leaves
            .iter()
            .map(|id| self.node(*id).filter.serialized_len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_filter(config: &IndexConfig, values: &[&[u8]]) -> BloomFilter {
        let mut f = BloomFilter::new(config.filter_bits, config.hash_count)
            .expect("valid config");
        for v in values {
            f.insert(v);
        }
        f
    }

    fn small_config() -> IndexConfig {
        IndexConfig {
            partition_size: 4,
            filter_bits: 512,
            hash_count: 4,
            branching: 2,
        }
    }

    #[test]
    fn single_leaf_becomes_root() {
        let config = small_config();
        let mut tree = IndexTree::new(config.clone()).unwrap();
        tree.add_leaf(
            leaf_filter(&config, &[b"v1"]),
            "seg-0".to_string(),
            b"a".to_vec(),
            b"m".to_vec(),
        )
        .unwrap();
        tree.build().unwrap();

        let root = tree.root_id().unwrap().expect("root");
        assert!(tree.node(root).is_leaf());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn interior_levels_group_by_branching() {
        let config = small_config();
        let mut tree = IndexTree::new(config.clone()).unwrap();
        for i in 0..5u8 {
            tree.add_leaf(
                leaf_filter(&config, &[&[b'v', i]]),
                format!("seg-{i}"),
                vec![b'a' + i * 2],
                vec![b'a' + i * 2 + 1],
            )
            .unwrap();
        }
        tree.build().unwrap();

        // 5 leaves at R=2: levels of 3, 2, then the root. 5 + 3 + 2 + 1.
        assert_eq!(tree.node_count(), 11);
        let root = tree.root_id().unwrap().expect("root");
        let root_node = tree.node(root);
        assert_eq!(root_node.start_key, vec![b'a']);
        assert_eq!(root_node.end_key, vec![b'a' + 9]);
        assert!(!root_node.is_leaf());
    }

    #[test]
    fn lifecycle_violations_fail_loudly() {
        let config = small_config();
        let mut tree = IndexTree::new(config.clone()).unwrap();
        let counters = ProbeCounters::new();

        // Query before build.
        assert!(matches!(
            tree.query_paths(b"v", &KeyRange::all(), &counters),
            Err(Error::Lifecycle(_))
        ));
        assert!(matches!(tree.root_id(), Err(Error::Lifecycle(_))));

        tree.add_leaf(
            leaf_filter(&config, &[b"v"]),
            "seg-0".to_string(),
            b"a".to_vec(),
            b"b".to_vec(),
        )
        .unwrap();
        tree.build().unwrap();

        // Double build and append after build.
        assert!(matches!(tree.build(), Err(Error::Lifecycle(_))));
        assert!(matches!(
            tree.add_leaf(
                leaf_filter(&config, &[b"w"]),
                "seg-1".to_string(),
                b"c".to_vec(),
                b"d".to_vec(),
            ),
            Err(Error::Lifecycle(_))
        ));
    }

    #[test]
    fn leaf_width_mismatch_is_rejected() {
        let config = small_config();
        let mut tree = IndexTree::new(config).unwrap();
        let foreign = BloomFilter::new(1024, 4).unwrap();
        assert!(matches!(
            tree.add_leaf(foreign, "seg-0".to_string(), b"a".to_vec(), b"b".to_vec()),
            Err(Error::FilterSizeMismatch { expected: 512, actual: 1024 })
        ));
    }

    #[test]
    fn empty_tree_builds_and_answers_empty() {
        let mut tree = IndexTree::new(small_config()).unwrap();
        tree.build().unwrap();
        assert_eq!(tree.root_id().unwrap(), None);

        let counters = ProbeCounters::new();
        let paths = tree
            .query_paths(b"anything", &KeyRange::all(), &counters)
            .unwrap();
        assert!(paths.is_empty());
        assert_eq!(counters.snapshot().bloom_probes, 0);
    }

    #[test]
    fn search_prunes_by_range_before_probing() {
        let config = small_config();
        let mut tree = IndexTree::new(config.clone()).unwrap();
        tree.add_leaf(
            leaf_filter(&config, &[b"v"]),
            "seg-0".to_string(),
            b"a".to_vec(),
            b"f".to_vec(),
        )
        .unwrap();
        tree.add_leaf(
            leaf_filter(&config, &[b"v"]),
            "seg-1".to_string(),
            b"g".to_vec(),
            b"p".to_vec(),
        )
        .unwrap();
        tree.build().unwrap();

        let counters = ProbeCounters::new();
        let paths = tree
            .query_paths(
                b"v",
                &KeyRange::new(b"h".to_vec(), b"k".to_vec()),
                &counters,
            )
            .unwrap();
        assert_eq!(paths, vec!["seg-1".to_string()]);

        // Root probed, seg-1 leaf probed; seg-0 pruned by range.
        let stats = counters.snapshot();
        assert_eq!(stats.bloom_probes, 2);
        assert_eq!(stats.leaf_bloom_probes, 1);
    }

    #[test]
    fn footprint_splits_interior_and_leaf_bytes() {
        let config = small_config();
        let mut tree = IndexTree::new(config.clone()).unwrap();
        for i in 0..3u8 {
            tree.add_leaf(
                leaf_filter(&config, &[&[i]]),
                format!("seg-{i}"),
                vec![i * 2],
                vec![i * 2 + 1],
            )
            .unwrap();
        }
        tree.build().unwrap();

        let per_filter = 12 + 512usize.div_ceil(8);
        assert_eq!(tree.leaf_filter_bytes(), 3 * per_filter);
        // One level of two interiors plus the root.
        assert_eq!(tree.interior_filter_bytes(), 3 * per_filter);
    }
}
