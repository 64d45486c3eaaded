use blix_bloom::BloomFilter;
use blix_store::{KeyBytes, SegmentPath};

/// Arena index of a node within its owning [`crate::IndexTree`].
///
/// Ids are only meaningful against the tree that issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf vs interior shape of an index node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Summarises one contiguous partition of `segment`.
    Leaf { segment: SegmentPath },
    /// Summarises its children by filter union and key-range enclosure.
    Interior { children: Vec<NodeId> },
}

/// One node of a hierarchical Bloom index.
///
/// The filter reports every value stored beneath the node (possibly with
/// false positives); `start_key`/`end_key` bound the keys beneath it,
/// inclusive on both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexNode {
    pub filter: BloomFilter,
    pub start_key: KeyBytes,
    pub end_key: KeyBytes,
    pub kind: NodeKind,
}

impl IndexNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Segment path for a leaf; `None` for interior nodes.
    #[inline]
    pub fn segment(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { segment } => Some(segment),
            NodeKind::Interior { .. } => None,
        }
    }
}
