//! Per-request worker pool with dedicated worker threads.
//!
//! The pool runs a fixed number of OS threads that share one bounded job queue
//! and one result stream. Any idle worker picks up any queued job, so results
//! arrive in completion order, not submission order. Every executed job yields
//! exactly one [`JobResult`](crate::core::JobResult) carrying its original job
//! number.
//!
//! # Termination
//!
//! Three triggers end the pool, and they may race freely:
//!
//! - **Explicit stop**: [`WorkerPool::stop`] is single-shot and idempotent.
//! - **Deadline / cancellation** of the [`CancelContext`](crate::core::CancelContext)
//!   the pool was started with.
//! - **Process shutdown**, modelled as cancellation of an ancestor context.
//!
//! Workers stop picking up jobs as soon as any trigger fires. A fetch already in
//! progress is not preempted, only bounded by the context deadline. The result
//! stream ends once every worker has exited.
//!
//! # Example
//!
//! ```rust,ignore
//! use content_mixer::core::{CancelContext, WorkerPool};
//!
//! let ctx = CancelContext::background().with_timeout(Duration::from_secs(1));
//! let pool = WorkerPool::start(&ctx, fetcher, 4)?;
//! pool.submit(job)?;
//! for result in pool.results() {
//!     // ...
//!     pool.stop();
//! }
//! pool.join();
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug)]
pub enum PoolError {
    /// A pool needs at least one worker.
    InvalidSize,

    /// The pool was stopped, or every worker has exited.
    Stopped,

    /// The pool's context was cancelled or its deadline passed.
    Cancelled,

    /// A worker or dispatcher thread could not be spawned.
    Spawn(std::io::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize => write!(f, "worker pool size must be at least 1"),
            Self::Stopped => write!(f, "pool has been stopped"),
            Self::Cancelled => write!(f, "pool context was cancelled"),
            Self::Spawn(err) => write!(f, "failed to spawn thread: {err}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Jobs currently executing.
    pub active_jobs: u64,

    /// Jobs accepted by `submit`.
    pub submitted_jobs: u64,

    /// Jobs whose result was delivered successfully.
    pub completed_jobs: u64,

    /// Jobs whose result was delivered as a failure.
    pub failed_jobs: u64,

    /// Jobs dequeued or finished after termination; no result was delivered.
    pub abandoned_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_jobs: AtomicU64,
    pub submitted_jobs: AtomicU64,
    pub completed_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
    pub abandoned_jobs: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_jobs: self.active_jobs.load(Ordering::Relaxed),
            submitted_jobs: self.submitted_jobs.load(Ordering::Relaxed),
            completed_jobs: self.completed_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
            abandoned_jobs: self.abandoned_jobs.load(Ordering::Relaxed),
        }
    }
}

/// Number of workers for a request: never more than there are jobs.
#[must_use]
pub fn pool_size(max_workers: usize, requested_count: usize) -> usize {
    max_workers.min(requested_count)
}

pub use native::{ResultStream, WorkerPool};
