//! Native implementation of `WorkerPool` using OS threads.
//!
//! Each worker thread has its own single-threaded tokio runtime that drives the
//! async executor, so fetches can be bounded with `tokio::time::timeout`
//! without blocking any caller runtime.
//!
//! # Design Principles
//!
//! - **Blocking waits when idle**: idle workers and `submit` block in a
//!   crossbeam `Select` over the job queue, the stop signal and the context's
//!   cancel and deadline channels
//! - **Preemptible fetches**: an executing job is cut off by a timer at the
//!   context deadline. Explicit cancellation is polled every
//!   `CANCEL_POLL_INTERVAL` while a job runs
//! - **Panic containment**: a panicking fetch becomes a failed result and the
//!   worker keeps serving
//! - **Single-shot stop**: an `AtomicBool` swap guards teardown
//! - **Stream closure by ownership**: only workers hold result senders, so the
//!   result stream ends exactly when the last worker has exited

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{
    bounded, unbounded, Receiver, Select, Sender, TryRecvError, TrySendError,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::cancel::CancelContext;
use crate::core::error::FetchError;
use crate::core::executor::JobExecutor;
use crate::core::job::{ContentItem, Job, JobResult};

use super::{PoolCounters, PoolError, PoolStats};

/// Termination signals a blocked worker or submitter waits on.
#[derive(Clone)]
struct Interrupts {
    stop: Receiver<()>,
    cancel: Vec<Receiver<()>>,
    deadline: Receiver<Instant>,
}

impl Interrupts {
    fn new(stop: Receiver<()>, ctx: &CancelContext) -> Self {
        Self {
            stop,
            cancel: ctx.done_channels(),
            deadline: ctx.deadline_channel(),
        }
    }

    fn register<'a>(&'a self, sel: &mut Select<'a>) {
        sel.recv(&self.stop);
        for rx in &self.cancel {
            sel.recv(rx);
        }
        sel.recv(&self.deadline);
    }
}

/// Receiving end of a pool's result stream.
///
/// Iteration blocks for the next result and ends once every worker has exited,
/// which only happens after the pool is stopped or its context ends.
pub struct ResultStream {
    rx: Receiver<JobResult>,
}

impl Iterator for ResultStream {
    type Item = JobResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// Bounded pool of worker threads serving one request.
///
/// # Design
///
/// - Job queue capacity equals the worker count, so `submit` applies
///   backpressure to the dispatcher
/// - The result stream is unbounded; workers never block on delivery
/// - Dropping the pool stops it but does not join the workers
pub struct WorkerPool {
    /// Number of worker threads.
    worker_count: usize,

    /// Context the pool was started with.
    ctx: CancelContext,

    /// Job sender. `None` once stopped.
    job_tx: Mutex<Option<Sender<Job>>>,

    /// Dropped on stop to disconnect `interrupts.stop`.
    stop_tx: Mutex<Option<Sender<()>>>,

    /// Signals `submit` waits on while the queue is full.
    interrupts: Interrupts,

    /// Result receiver; workers own every sender.
    results: Receiver<JobResult>,

    /// Single-shot stop flag.
    stopped: Arc<AtomicBool>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start `size` workers that run `executor` for every submitted job.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidSize` if `size` is zero
    /// - `PoolError::Spawn` if a worker thread cannot be created; workers
    ///   already running are stopped and joined first
    pub fn start<E: JobExecutor>(
        ctx: &CancelContext,
        executor: E,
        size: usize,
    ) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::InvalidSize);
        }

        let (job_tx, job_rx) = bounded::<Job>(size);
        let (result_tx, result_rx) = unbounded::<JobResult>();
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let interrupts = Interrupts::new(stop_rx, ctx);

        let pool = Self {
            worker_count: size,
            ctx: ctx.clone(),
            job_tx: Mutex::new(Some(job_tx)),
            stop_tx: Mutex::new(Some(stop_tx)),
            interrupts,
            results: result_rx,
            stopped: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(PoolCounters::default()),
            workers: Mutex::new(Vec::with_capacity(size)),
        };

        for worker_id in 0..size {
            let worker = Worker {
                id: worker_id,
                jobs: job_rx.clone(),
                results: result_tx.clone(),
                interrupts: pool.interrupts.clone(),
                ctx: ctx.clone(),
                stopped: Arc::clone(&pool.stopped),
                counters: Arc::clone(&pool.counters),
                executor: executor.clone(),
            };
            match spawn_worker(worker) {
                Ok(handle) => pool.workers.lock().push(handle),
                Err(err) => {
                    error!(worker_id = worker_id, error = %err, "Failed to spawn pool worker");
                    pool.shutdown();
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        info!(worker_count = size, "Worker pool started");
        Ok(pool)
    }

    /// Queue a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// - `PoolError::Stopped` if the pool was stopped or every worker exited
    /// - `PoolError::Cancelled` if the pool's context ended
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let Some(job_tx) = self.job_tx.lock().clone() else {
            return Err(PoolError::Stopped);
        };

        let job_number = job.job_number;
        let mut sel = Select::new();
        let send_index = sel.send(&job_tx);
        self.interrupts.register(&mut sel);

        let mut pending = job;
        loop {
            if self.is_stopped() || self.ctx.is_cancelled() || sel.ready() != send_index {
                return Err(self.termination_error());
            }
            match job_tx.try_send(pending) {
                Ok(()) => {
                    self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
                    debug!(job_number = job_number, "Job queued");
                    return Ok(());
                }
                // Another producer filled the slot first.
                Err(TrySendError::Full(job)) => pending = job,
                Err(TrySendError::Disconnected(_)) => return Err(PoolError::Stopped),
            }
        }
    }

    /// Signal every worker to stop picking up jobs.
    ///
    /// Only the first call has an effect; later calls return immediately.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!(worker_count = self.worker_count, "Stopping worker pool");
        self.stop_tx.lock().take();
        self.job_tx.lock().take();
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stream of job results in completion order.
    #[must_use]
    pub fn results(&self) -> ResultStream {
        ResultStream {
            rx: self.results.clone(),
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.worker_count)
    }

    /// Stop the pool and wait for every worker thread to exit.
    pub fn shutdown(&self) {
        self.stop();
        self.join();
    }

    /// Wait for every worker thread to exit.
    ///
    /// Blocks until the pool is stopped or its context ends. A worker in the
    /// middle of a fetch exits once the fetch returns, which the context
    /// deadline bounds.
    pub fn join(&self) {
        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for (worker_id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                warn!(worker_id = worker_id, "Worker panicked");
            }
        }
    }

    fn termination_error(&self) -> PoolError {
        if self.ctx.is_cancelled() {
            PoolError::Cancelled
        } else {
            PoolError::Stopped
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal only. Joining here could block on an in-flight fetch.
        self.stop();
    }
}

/// State moved into one worker thread.
struct Worker<E> {
    id: usize,
    jobs: Receiver<Job>,
    results: Sender<JobResult>,
    interrupts: Interrupts,
    ctx: CancelContext,
    stopped: Arc<AtomicBool>,
    counters: Arc<PoolCounters>,
    executor: E,
}

/// How often an executing worker checks for explicit cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Resolves once `ctx` is cancelled.
async fn cancelled(ctx: &CancelContext) {
    while !ctx.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

/// Message carried by a panic payload.
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Spawn a worker thread.
fn spawn_worker<E: JobExecutor>(worker: Worker<E>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("content-worker-{}", worker.id))
        .spawn(move || worker.run())
}

impl<E: JobExecutor> Worker<E> {
    fn run(self) {
        debug!(worker_id = self.id, "Worker thread started");

        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!(worker_id = self.id, error = %e, "Failed to create worker runtime");
                return;
            }
        };

        let mut sel = Select::new();
        let job_index = sel.recv(&self.jobs);
        self.interrupts.register(&mut sel);

        loop {
            if sel.ready() != job_index {
                debug!(worker_id = self.id, "Termination signalled, exiting");
                break;
            }
            let job = match self.jobs.try_recv() {
                Ok(job) => job,
                // Another worker took it.
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Disconnected) => {
                    debug!(worker_id = self.id, "Job queue closed, exiting");
                    break;
                }
            };

            if self.is_terminated() {
                self.counters.abandoned_jobs.fetch_add(1, Ordering::Relaxed);
                debug!(worker_id = self.id, job_number = job.job_number, "Job abandoned after termination");
                break;
            }

            debug!(
                worker_id = self.id,
                job_number = job.job_number,
                source = %job.source.source,
                "Worker executing job"
            );

            self.counters.active_jobs.fetch_add(1, Ordering::Relaxed);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rt.block_on(self.execute(&job))))
                .unwrap_or_else(|payload| {
                    let reason = panic_reason(payload.as_ref());
                    error!(
                        worker_id = self.id,
                        job_number = job.job_number,
                        reason = %reason,
                        "Fetch panicked, reporting job as failed"
                    );
                    Err(FetchError::Panicked {
                        source_id: job.source.source.clone(),
                        reason,
                    })
                });
            self.counters.active_jobs.fetch_sub(1, Ordering::Relaxed);

            self.deliver(JobResult::new(&job, outcome));
        }

        debug!(worker_id = self.id, "Worker thread exiting");
    }

    fn is_terminated(&self) -> bool {
        self.stopped.load(Ordering::Acquire) || self.ctx.is_cancelled()
    }

    /// Run the executor, bounded by the time left on the context and
    /// preempted by explicit cancellation.
    async fn execute(&self, job: &Job) -> Result<Vec<ContentItem>, FetchError> {
        let bounded = async {
            match self.ctx.remaining() {
                Some(remaining) => tokio::time::timeout(remaining, self.executor.execute(job))
                    .await
                    .unwrap_or(Err(FetchError::Cancelled)),
                None => self.executor.execute(job).await,
            }
        };
        tokio::select! {
            outcome = bounded => outcome,
            () = cancelled(&self.ctx) => Err(FetchError::Cancelled),
        }
    }

    fn deliver(&self, result: JobResult) {
        let job_number = result.job_number;
        if self.stopped.load(Ordering::Acquire) {
            self.counters.abandoned_jobs.fetch_add(1, Ordering::Relaxed);
            debug!(worker_id = self.id, job_number = job_number, "Pool stopped, discarding result");
            return;
        }

        let success = result.is_success();
        if self.results.send(result).is_err() {
            self.counters.abandoned_jobs.fetch_add(1, Ordering::Relaxed);
            debug!(worker_id = self.id, job_number = job_number, "Result stream closed, discarding result");
            return;
        }

        if success {
            self.counters.completed_jobs.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.failed_jobs.fetch_add(1, Ordering::Relaxed);
        }
    }
}
