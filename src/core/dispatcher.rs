//! Sequential job producer for one request.

use tracing::debug;

use crate::core::job::{Job, JobNumber, Requester};
use crate::core::schedule::Schedule;
use crate::core::worker_pool::WorkerPool;

/// Items asked of a source per job.
pub const ITEMS_PER_JOB: usize = 1;

/// What a request asks the dispatcher to enumerate.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    /// Number of jobs (and items) the request wants.
    pub requested_count: usize,
    /// Schedule slot job 0 is bound to.
    pub start_offset: usize,
    /// Caller identity forwarded to sources.
    pub requester: Requester,
}

/// Enumerate the jobs of `plan` in job-number order.
pub fn jobs<'a>(schedule: &'a Schedule, plan: &'a DispatchPlan) -> impl Iterator<Item = Job> + 'a {
    (0..plan.requested_count).map(move |job_number: JobNumber| Job {
        source: schedule.resolve(plan.start_offset, job_number).clone(),
        requested_count: ITEMS_PER_JOB,
        requester: plan.requester.clone(),
        job_number,
    })
}

/// Feed every job of `plan` to `pool`, in order, blocking on backpressure.
///
/// Stops at the first rejected submission (pool stopped or context ended) and
/// returns how many jobs were dispatched. Job numbers are never skipped or
/// reordered.
pub fn dispatch_jobs(schedule: &Schedule, plan: &DispatchPlan, pool: &WorkerPool) -> usize {
    let mut dispatched = 0;
    for job in jobs(schedule, plan) {
        let job_number = job.job_number;
        if let Err(err) = pool.submit(job) {
            debug!(job_number = job_number, error = %err, "Dispatch ended early");
            break;
        }
        dispatched += 1;
    }
    debug!(dispatched = dispatched, requested = plan.requested_count, "Dispatcher finished");
    dispatched
}
