//! Round-robin source schedule.
//!
//! A schedule is the fixed, ordered list of sources a request cycles through.
//! Job `i` of a request starting at offset `O` is served by entry
//! `(O + i) mod L`, so a request for more items than there are sources simply
//! wraps around.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// Identifier of a content source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One schedule slot: a primary source and an optional single fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Primary source.
    #[serde(rename = "type")]
    pub source: SourceId,
    /// Source tried once if the primary fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<SourceId>,
}

impl SourceConfig {
    /// Slot without a fallback.
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
            fallback: None,
        }
    }

    /// Set the fallback source.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<SourceId>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

/// Map a linear job index onto a schedule position.
///
/// # Errors
///
/// Returns [`ConfigError::EmptySchedule`] when `len` is zero.
pub fn resolve_index(len: usize, start_offset: usize, job_index: usize) -> Result<usize, ConfigError> {
    if len == 0 {
        return Err(ConfigError::EmptySchedule);
    }
    // Reduce both terms first so the sum cannot overflow.
    Ok((start_offset % len + job_index % len) % len)
}

/// Non-empty, immutable, ordered list of sources.
///
/// Cloning is cheap; the entries are shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SourceConfig>", into = "Vec<SourceConfig>")]
pub struct Schedule {
    sources: Arc<[SourceConfig]>,
}

impl Schedule {
    /// Build a schedule from an ordered list of sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySchedule`] if `sources` is empty.
    pub fn new(sources: Vec<SourceConfig>) -> Result<Self, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        Ok(Self {
            sources: sources.into(),
        })
    }

    /// Number of slots in one round.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false; a schedule cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Slots in round-robin order.
    #[must_use]
    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Index of the slot a request with the given offset starts from.
    #[must_use]
    pub fn start_offset(&self, requested_offset: usize) -> usize {
        requested_offset % self.len()
    }

    /// Slot serving job `job_number` of a request starting at `start_offset`.
    #[must_use]
    pub fn resolve(&self, start_offset: usize, job_number: usize) -> &SourceConfig {
        let len = self.len();
        &self.sources[(start_offset % len + job_number % len) % len]
    }

    /// Every source identifier the schedule can reach, primaries and fallbacks.
    pub fn source_ids(&self) -> impl Iterator<Item = &SourceId> {
        self.sources
            .iter()
            .flat_map(|slot| std::iter::once(&slot.source).chain(slot.fallback.as_ref()))
    }
}

impl TryFrom<Vec<SourceConfig>> for Schedule {
    type Error = ConfigError;

    fn try_from(sources: Vec<SourceConfig>) -> Result<Self, Self::Error> {
        Self::new(sources)
    }
}

impl From<Schedule> for Vec<SourceConfig> {
    fn from(schedule: Schedule) -> Self {
        schedule.sources.to_vec()
    }
}
