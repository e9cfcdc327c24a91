//! Rayon thread pool configuration for trial workloads.
//!
//! [WorkerPool::install] runs the Monte Carlo batches on a pool with a fixed
//! thread count, or on Rayon's global pool (all cores) when unbounded.

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads run the trial batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a pool with this worker count. A zero count uses the
    /// global Rayon pool; otherwise a temporary pool is built for the call.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("Rayon thread pool");
            pool.install(f)
        }
    }
}
