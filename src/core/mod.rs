//! Core aggregation engine: schedule, worker pool, fallback, and ordering.

pub mod aggregator;
pub mod cancel;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod job;
pub mod registry;
pub mod schedule;
pub mod worker_pool;

pub use aggregator::{AggregateOutcome, Aggregator, AggregatorState};
pub use cancel::CancelContext;
pub use dispatcher::{dispatch_jobs, DispatchPlan, ITEMS_PER_JOB};
pub use engine::aggregate;
pub use error::{AppResult, ConfigError, FetchError, RequestError};
pub use executor::{ContentSource, JobExecutor};
pub use fallback::FallbackFetcher;
pub use job::{ContentItem, ContentRequest, Job, JobNumber, JobResult, Requester};
pub use registry::SourceRegistry;
pub use schedule::{resolve_index, Schedule, SourceConfig, SourceId};
pub use worker_pool::{pool_size, PoolError, PoolStats, ResultStream, WorkerPool};
