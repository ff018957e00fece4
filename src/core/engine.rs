//! Engine entry point: one request through pool, dispatcher and aggregator.

use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::AggregatorConfig;
use crate::core::aggregator::{AggregateOutcome, Aggregator};
use crate::core::cancel::CancelContext;
use crate::core::dispatcher::{dispatch_jobs, DispatchPlan};
use crate::core::executor::JobExecutor;
use crate::core::job::ContentRequest;
use crate::core::worker_pool::{pool_size, PoolError, WorkerPool};

/// Aggregate `request` with `executor`, bounded by `ctx`.
///
/// Runs the dispatcher on a scoped thread and the aggregator on the calling
/// thread. Every thread started here has exited when the call returns.
///
/// # Errors
///
/// Returns [`PoolError::Spawn`] if the pool or dispatcher thread cannot be
/// started. Source failures never surface here; they truncate the outcome.
pub fn aggregate<E: JobExecutor>(
    config: &AggregatorConfig,
    executor: E,
    request: &ContentRequest,
    ctx: &CancelContext,
) -> Result<AggregateOutcome, PoolError> {
    if request.count == 0 {
        return Ok(Aggregator::new(0).finish());
    }

    let schedule = &config.schedule;
    let plan = DispatchPlan {
        requested_count: request.count,
        start_offset: schedule.start_offset(request.offset),
        requester: request.requester.clone(),
    };
    let started = Instant::now();
    let pool = WorkerPool::start(ctx, executor, pool_size(config.max_workers, request.count))?;

    let result: Result<(AggregateOutcome, usize), PoolError> = thread::scope(|scope| {
        let dispatcher = thread::Builder::new()
            .name("content-dispatcher".into())
            .spawn_scoped(scope, || dispatch_jobs(schedule, &plan, &pool))
            .map_err(PoolError::Spawn)?;

        let outcome = Aggregator::new(request.count).collect(&pool);
        let dispatched = dispatcher.join().unwrap_or_else(|_| {
            warn!("Dispatcher panicked");
            0
        });
        Ok((outcome, dispatched))
    });

    // On spawn failure the aggregator never ran, so nothing has stopped the pool yet.
    pool.shutdown();
    let (mut outcome, dispatched) = result?;
    outcome.dispatched = dispatched;

    info!(
        requester = %request.requester,
        requested = request.count,
        dispatched = outcome.dispatched,
        observed = outcome.observed,
        returned = outcome.items.len(),
        boundary = outcome.boundary,
        cancelled = ctx.is_cancelled(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Aggregation finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchError;
    use crate::core::job::{ContentItem, Job};
    use crate::core::schedule::{Schedule, SourceConfig};
    use async_trait::async_trait;

    #[derive(Clone)]
    struct Echo;

    #[async_trait]
    impl JobExecutor for Echo {
        async fn execute(&self, job: &Job) -> Result<Vec<ContentItem>, FetchError> {
            Ok(vec![ContentItem::new(
                job.source.source.clone(),
                job.job_number.to_string(),
                "echo",
            )])
        }
    }

    fn config() -> AggregatorConfig {
        let schedule = Schedule::new(vec![SourceConfig::new("a"), SourceConfig::new("b")]).unwrap();
        AggregatorConfig::new(schedule).with_max_workers(3)
    }

    #[test]
    fn test_aggregate_wraps_schedule() {
        let ctx = CancelContext::background();
        let outcome = aggregate(&config(), Echo, &ContentRequest::new(5, 1, "1.1.1.1"), &ctx).unwrap();
        let sources: Vec<&str> = outcome.items.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, ["b", "a", "b", "a", "b"]);
        assert!(!outcome.is_truncated());
        assert_eq!(outcome.dispatched, 5);
        assert_eq!(outcome.observed, 5);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let ctx = CancelContext::background();
        let outcome = aggregate(&config(), Echo, &ContentRequest::new(0, 0, "x"), &ctx).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.boundary, 0);
    }
}
