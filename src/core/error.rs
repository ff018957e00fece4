//! Error types for configuration, request validation, and source fetches.

use std::time::Duration;

use thiserror::Error;

use crate::core::schedule::SourceId;

/// Startup-time configuration failures. Never raised while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The source schedule has no entries.
    #[error("source schedule must contain at least one source")]
    EmptySchedule,
    /// A schedule entry (primary or fallback) names a source with no registered capability.
    #[error("no content source registered for `{0}`")]
    UnknownSource(SourceId),
    /// A numeric setting is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The configuration document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Malformed caller input. Surfaced to the caller as a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A required query parameter is absent.
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),
    /// A query parameter is not an integer.
    #[error("query parameter `{param}` is not an integer: {value:?}")]
    Malformed {
        /// Parameter name.
        param: &'static str,
        /// Raw value received.
        value: String,
    },
    /// `count` must be at least one.
    #[error("count must be at least 1, got {0}")]
    CountTooSmall(i64),
    /// `offset` must not be negative.
    #[error("offset must not be negative, got {0}")]
    NegativeOffset(i64),
    /// `count` exceeds the configured per-request limit.
    #[error("count must be at most {max}, got {count}")]
    CountTooLarge {
        /// Count the caller asked for.
        count: usize,
        /// Configured `max_count`.
        max: usize,
    },
}

/// Outcome of a failed job fetch. Only ever moves the truncation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source returned an error and no fallback was configured.
    #[error("source `{source_id}` failed: {reason}")]
    Source {
        /// Source that failed.
        source_id: SourceId,
        /// Error text reported by the source.
        reason: String,
    },
    /// The source did not answer within the per-call timeout.
    #[error("source `{source_id}` timed out after {timeout:?}")]
    TimedOut {
        /// Source that timed out.
        source_id: SourceId,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// No capability is registered for the source.
    #[error("no content source registered for `{0}`")]
    UnknownSource(SourceId),
    /// The primary source failed and its single fallback failed too.
    #[error("source `{source_id}` failed ({primary_error}); fallback `{fallback}` failed: {fallback_error}")]
    Fallback {
        /// Primary source of the job.
        source_id: SourceId,
        /// Fallback source that was tried.
        fallback: SourceId,
        /// Failure of the primary source.
        primary_error: Box<FetchError>,
        /// Failure of the fallback source.
        fallback_error: Box<FetchError>,
    },
    /// The request context ended while the job was executing.
    #[error("job cancelled before the fetch completed")]
    Cancelled,
    /// The fetch panicked. The worker recovered and reported the job as failed.
    #[error("fetch from `{source_id}` panicked: {reason}")]
    Panicked {
        /// Source of the job whose fetch panicked.
        source_id: SourceId,
        /// Panic message, when it was a string.
        reason: String,
    },
}

impl FetchError {
    /// Whether this failure came from the request context rather than a source.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Application-facing result using anyhow, returned by content sources.
pub type AppResult<T> = Result<T, anyhow::Error>;
