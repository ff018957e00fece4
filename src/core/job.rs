//! Jobs, job results, and the content items they carry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::FetchError;
use crate::core::schedule::{SourceConfig, SourceId};

/// Position of a fetch attempt within a request's intended output order.
pub type JobNumber = usize;

/// Opaque identity of the caller, forwarded to every source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requester(String);

impl Requester {
    /// Wrap a caller identity (typically a client address).
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Borrow the identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single piece of content returned by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Item identifier, unique within its source.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Source that produced the item.
    pub source: SourceId,
    /// Short description.
    #[serde(default)]
    pub summary: String,
    /// Link to the full content.
    #[serde(default)]
    pub link: String,
}

impl ContentItem {
    /// Minimal item tagged with its source.
    pub fn new(source: impl Into<SourceId>, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
            summary: String::new(),
            link: String::new(),
        }
    }
}

/// A validated caller request: `count` items starting at schedule slot `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Number of items wanted. At least one.
    pub count: usize,
    /// Requested schedule offset, reduced modulo the schedule length.
    pub offset: usize,
    /// Caller identity.
    pub requester: Requester,
}

impl ContentRequest {
    /// Build a request.
    pub fn new(count: usize, offset: usize, requester: impl Into<String>) -> Self {
        Self {
            count,
            offset,
            requester: Requester::new(requester),
        }
    }
}

/// One fetch attempt, bound to a schedule slot.
#[derive(Debug, Clone)]
pub struct Job {
    /// Slot serving this job.
    pub source: SourceConfig,
    /// Items asked of the source.
    pub requested_count: usize,
    /// Caller identity.
    pub requester: Requester,
    /// Position in the output order.
    pub job_number: JobNumber,
}

/// Outcome of a job, delivered exactly once to the aggregator.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Job this result belongs to.
    pub job_number: JobNumber,
    /// Items the job asked for.
    pub requested_count: usize,
    /// Items in source order, or the terminal fetch failure.
    pub outcome: Result<Vec<ContentItem>, FetchError>,
}

impl JobResult {
    /// Wrap an executor outcome for `job`.
    #[must_use]
    pub fn new(job: &Job, outcome: Result<Vec<ContentItem>, FetchError>) -> Self {
        Self {
            job_number: job.job_number,
            requested_count: job.requested_count,
            outcome,
        }
    }

    /// True when the job produced items.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
