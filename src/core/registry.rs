//! Source identifier to capability lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::error::ConfigError;
use crate::core::executor::ContentSource;
use crate::core::schedule::{Schedule, SourceId};

/// Registry of content sources, resolved once per fetch attempt.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceId, Arc<dyn ContentSource>>,
}

impl SourceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `id`, replacing any previous entry.
    #[must_use]
    pub fn with_source(mut self, id: impl Into<SourceId>, source: Arc<dyn ContentSource>) -> Self {
        self.register(id, source);
        self
    }

    /// Register `source` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<SourceId>, source: Arc<dyn ContentSource>) {
        self.sources.insert(id.into(), source);
    }

    /// Look up a source.
    #[must_use]
    pub fn get(&self, id: &SourceId) -> Option<&Arc<dyn ContentSource>> {
        self.sources.get(id)
    }

    /// Whether `id` has a registered source.
    #[must_use]
    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Check that every primary and fallback in `schedule` is registered.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSource`] for the first missing source.
    pub fn validate_schedule(&self, schedule: &Schedule) -> Result<(), ConfigError> {
        match schedule.source_ids().find(|id| !self.contains(id)) {
            Some(missing) => Err(ConfigError::UnknownSource(missing.clone())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.sources.keys().map(SourceId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("SourceRegistry").field("sources", &ids).finish()
    }
}
