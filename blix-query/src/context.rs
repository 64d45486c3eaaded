use std::time::{Duration, Instant};

use blix_index::{ProbeCounters, ProbeStats};
use blix_store::KeyBytes;

/// Per-query telemetry holder.
///
/// Created fresh at the start of every top-level query, so counters
/// start at zero and are never reset mid-query; workers share it by
/// reference and the caller reads the totals after the query joins.
pub struct QueryContext {
    counters: ProbeCounters,
    started: Instant,
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            counters: ProbeCounters::new(),
            started: Instant::now(),
        }
    }

    #[inline]
    pub fn counters(&self) -> &ProbeCounters {
        &self.counters
    }

    /// Close out the query: snapshot the counters and the elapsed time.
    pub fn finish(self) -> QueryTelemetry {
        QueryTelemetry {
            stats: self.counters.snapshot(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter totals and wall time of one query invocation.
#[derive(Copy, Clone, Debug)]
pub struct QueryTelemetry {
    pub stats: ProbeStats,
    pub elapsed: Duration,
}

/// Result of one query: matching keys plus telemetry.
///
/// Keys are deduplicated and sorted byte-lexicographically.
#[derive(Debug)]
pub struct QueryOutcome {
    pub keys: Vec<KeyBytes>,
    pub telemetry: QueryTelemetry,
}
