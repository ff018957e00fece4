//! Source and job execution traits.

use async_trait::async_trait;

use super::error::{AppResult, FetchError};
use super::job::{ContentItem, Job, Requester};

/// A content provider capability.
///
/// Implementations are looked up by source identifier in a
/// [`SourceRegistry`](crate::core::SourceRegistry).
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use content_mixer::core::{AppResult, ContentItem, ContentSource, Requester};
///
/// struct Headlines;
///
/// #[async_trait]
/// impl ContentSource for Headlines {
///     async fn fetch(&self, requester: &Requester, count: usize) -> AppResult<Vec<ContentItem>> {
///         Ok((0..count)
///             .map(|i| ContentItem::new("headlines", i.to_string(), format!("for {requester}")))
///             .collect())
///     }
/// }
/// ```
///
/// # Cancellation
///
/// Fetches run inside a worker's tokio runtime and are dropped at the request
/// deadline or on cancellation. A source that blocks its thread instead of
/// awaiting cannot be interrupted and holds its worker past the deadline.
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
    /// Fetch up to `count` items for `requester`.
    async fn fetch(&self, requester: &Requester, count: usize) -> AppResult<Vec<ContentItem>>;
}

/// Strategy a pool worker runs for each job.
///
/// Called from a dedicated worker thread with its own single-threaded tokio
/// runtime.
#[async_trait]
pub trait JobExecutor: Send + Sync + Clone + 'static {
    /// Execute `job` and return its items or its terminal failure.
    async fn execute(&self, job: &Job) -> Result<Vec<ContentItem>, FetchError>;
}
