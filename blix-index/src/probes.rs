use std::sync::atomic::{AtomicU64, Ordering};

/// Probe telemetry for one top-level query.
///
/// Owned by the query call that created it and shared by reference with
/// every worker the query dispatches. Counters are monotone within a
/// query and only read after all workers have joined, so relaxed ordering
/// suffices.
#[derive(Debug, Default)]
pub struct ProbeCounters {
    bloom: AtomicU64,
    leaf_bloom: AtomicU64,
    sst: AtomicU64,
}

impl ProbeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one Bloom membership test; `leaf` marks tests against leaf
    /// nodes, which are counted in both totals.
    #[inline]
    pub fn record_probe(&self, leaf: bool) {
        self.bloom.fetch_add(1, Ordering::Relaxed);
        if leaf {
            self.leaf_bloom.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record `n` segment-file checks (terminal scans or the candidate
    /// count of a single-index probe).
    #[inline]
    pub fn record_sst_checks(&self, n: u64) {
        self.sst.fetch_add(n, Ordering::Relaxed);
    }

    /// Read the counters. Call after joining all workers.
    pub fn snapshot(&self) -> ProbeStats {
        ProbeStats {
            bloom_probes: self.bloom.load(Ordering::Relaxed),
            leaf_bloom_probes: self.leaf_bloom.load(Ordering::Relaxed),
            sst_checks: self.sst.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a query's probe counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Total Bloom membership tests, leaves and interiors alike.
    pub bloom_probes: u64,
    /// The subset of `bloom_probes` performed on leaf nodes.
    pub leaf_bloom_probes: u64,
    /// Segment files scanned or counted for scanning.
    pub sst_checks: u64,
}
