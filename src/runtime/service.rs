//! Content service: the request-level surface around the engine.
//!
//! A service owns a root [`CancelContext`] representing process lifetime.
//! Every request runs under a child of it with the configured request
//! timeout, so [`ContentService::shutdown`] reaches all in-flight requests.

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::AggregatorConfig;
use crate::core::cancel::CancelContext;
use crate::core::engine::aggregate;
use crate::core::error::RequestError;
use crate::core::executor::JobExecutor;
use crate::core::job::ContentRequest;

use super::api::{requester_identity, ContentResponse, ServiceError, ServiceResponse};

/// Serves content requests with a shared configuration and executor.
#[derive(Clone)]
pub struct ContentService<E> {
    config: AggregatorConfig,
    executor: E,
    root: CancelContext,
}

impl<E: JobExecutor> ContentService<E> {
    /// Service with a fresh root context.
    pub fn new(config: AggregatorConfig, executor: E) -> Self {
        Self {
            config,
            executor,
            root: CancelContext::background(),
        }
    }

    /// Configuration every request is served with.
    #[must_use]
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate `request` under a child context bounded by the request timeout.
    ///
    /// The result may be shorter than requested: source failures and the
    /// deadline truncate it to a prefix of the schedule order.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` if `count` exceeds the configured
    ///   `max_count`
    /// - `ServiceError::ShuttingDown` if the service was shut down before or
    ///   during the request
    /// - `ServiceError::Pool` if the worker pool could not be started
    pub fn serve(&self, request: &ContentRequest) -> Result<ContentResponse, ServiceError> {
        if self.is_shutting_down() {
            return Err(ServiceError::ShuttingDown);
        }
        if request.count > self.config.max_count {
            return Err(RequestError::CountTooLarge {
                count: request.count,
                max: self.config.max_count,
            }
            .into());
        }

        let request_id = Uuid::new_v4();
        let span = info_span!(
            "content_request",
            request_id = %request_id,
            requester = %request.requester,
            count = request.count,
            offset = request.offset
        );
        let _guard = span.enter();

        let ctx = self.root.with_timeout(self.config.request_timeout());
        let outcome = aggregate(&self.config, self.executor.clone(), request, &ctx)?;

        if let Some((job_number, err)) = &outcome.boundary_failure {
            debug!(job_number = *job_number, error = %err, "Response truncated at failed job");
        }
        if self.is_shutting_down() {
            warn!(returned = outcome.items.len(), "Request interrupted by shutdown");
            return Err(ServiceError::ShuttingDown);
        }
        Ok(outcome.items)
    }

    /// Parse a raw query, serve it, and render the response.
    ///
    /// Never fails: every error becomes a status code with a JSON error body.
    pub fn handle_query(&self, query: &str, forwarded_for: Option<&str>, remote_addr: &str) -> ServiceResponse {
        let requester = requester_identity(forwarded_for, remote_addr);
        let result = ContentRequest::from_query(query, requester)
            .map_err(ServiceError::from)
            .and_then(|request| self.serve(&request));

        match result {
            Ok(items) => ServiceResponse::ok(&items),
            Err(err) => {
                debug!(status = err.status_code(), error = %err, "Request rejected");
                ServiceResponse::from_error(&err)
            }
        }
    }

    /// Cancel every in-flight request and reject new ones. Idempotent.
    pub fn shutdown(&self) {
        if !self.root.is_cancelled() {
            info!("Content service shutting down");
        }
        self.root.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Root context of the service, for tying other work to its lifetime.
    #[must_use]
    pub fn context(&self) -> &CancelContext {
        &self.root
    }
}
