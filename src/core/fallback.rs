//! Fetch-with-fallback job execution.
//!
//! The primary source of a job is tried once. If it fails and the slot names a
//! fallback, the fallback is tried once and its outcome is final. There is no
//! chaining, no retry of the same source, and no backoff.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::error::FetchError;
use crate::core::executor::JobExecutor;
use crate::core::job::{ContentItem, Job};
use crate::core::registry::SourceRegistry;
use crate::core::schedule::SourceId;

/// [`JobExecutor`] that resolves sources through a [`SourceRegistry`] and
/// applies the single-fallback policy.
#[derive(Debug, Clone)]
pub struct FallbackFetcher {
    registry: SourceRegistry,
    fetch_timeout: Option<Duration>,
}

impl FallbackFetcher {
    /// Fetcher without a per-call timeout.
    #[must_use]
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            fetch_timeout: None,
        }
    }

    /// Bound every individual source call by `timeout`.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Registry sources are resolved from.
    #[must_use]
    pub const fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// One call to one source.
    async fn attempt(&self, source_id: &SourceId, job: &Job) -> Result<Vec<ContentItem>, FetchError> {
        let source = self
            .registry
            .get(source_id)
            .ok_or_else(|| FetchError::UnknownSource(source_id.clone()))?;

        let fetch = source.fetch(&job.requester, job.requested_count);
        let outcome = match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| FetchError::TimedOut {
                    source_id: source_id.clone(),
                    timeout,
                })?,
            None => fetch.await,
        };

        outcome.map_err(|err| FetchError::Source {
            source_id: source_id.clone(),
            reason: format!("{err:#}"),
        })
    }
}

#[async_trait]
impl JobExecutor for FallbackFetcher {
    async fn execute(&self, job: &Job) -> Result<Vec<ContentItem>, FetchError> {
        let primary = &job.source.source;
        let primary_error = match self.attempt(primary, job).await {
            Ok(items) => return Ok(items),
            Err(err) => err,
        };

        let Some(fallback) = job.source.fallback.as_ref() else {
            debug!(job_number = job.job_number, error = %primary_error, "Source failed without fallback");
            return Err(primary_error);
        };

        warn!(
            job_number = job.job_number,
            source = %primary,
            fallback = %fallback,
            error = %primary_error,
            "Source failed, trying fallback"
        );

        self.attempt(fallback, job)
            .await
            .map_err(|fallback_error| FetchError::Fallback {
                source_id: primary.clone(),
                fallback: fallback.clone(),
                primary_error: Box::new(primary_error),
                fallback_error: Box::new(fallback_error),
            })
    }
}
