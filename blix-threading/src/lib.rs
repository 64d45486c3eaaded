//! Shared worker pool for segment ingestion and terminal query scans.
//!
//! One [`WorkerPool`] is expected per process, created once and handed by
//! reference to every `IndexBuilder` and query engine. Closures run under
//! [`WorkerPool::install`] so rayon parallel iterators inside them are
//! serviced by this pool rather than the implicit global one.

use std::sync::Arc;
use std::thread::available_parallelism;

use blix_result::{Error, Result};

/// Handle to a fixed-width rayon thread pool.
///
/// Cloning is cheap; clones share the same underlying pool. Tasks are
/// CPU-and-I/O mixed (segment scans block on the store), so the pool is
/// sized to the machine's available parallelism by default.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Build a pool sized to `available_parallelism`.
    pub fn new() -> Result<Self> {
        let workers = available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::with_threads(workers)
    }

    /// Build a pool with an explicit worker count.
    pub fn with_threads(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidConfig(
                "worker pool needs at least one thread".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("blix-worker-{i}"))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Run `f` inside the pool so rayon parallel iterators it spawns are
    /// serviced by this pool. Blocks until `f` returns.
    #[inline]
    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }

    /// Number of worker threads in the pool.
    #[inline]
    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}
