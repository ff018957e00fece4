//! Builders to construct a content service from configuration.

use std::sync::Arc;

use tracing::info;

use crate::config::AggregatorConfig;
use crate::core::error::ConfigError;
use crate::core::executor::ContentSource;
use crate::core::fallback::FallbackFetcher;
use crate::core::registry::SourceRegistry;
use crate::core::schedule::SourceId;
use crate::runtime::ContentService;

/// Build the fallback fetcher for `cfg`, asking `source_factory` for every
/// source the schedule names (primaries and fallbacks, each once).
///
/// # Errors
///
/// Returns the first [`ConfigError`] from validation or from the factory.
pub fn build_fetcher<F>(cfg: &AggregatorConfig, mut source_factory: F) -> Result<FallbackFetcher, ConfigError>
where
    F: FnMut(&SourceId) -> Result<Arc<dyn ContentSource>, ConfigError>,
{
    cfg.validate()?;

    let mut registry = SourceRegistry::new();
    for id in cfg.schedule.source_ids() {
        if !registry.contains(id) {
            let source = source_factory(id)?;
            registry.register(id.clone(), source);
        }
    }
    registry.validate_schedule(&cfg.schedule)?;

    let fetcher = FallbackFetcher::new(registry);
    Ok(match cfg.fetch_timeout() {
        Some(timeout) => fetcher.with_fetch_timeout(timeout),
        None => fetcher,
    })
}

/// Build a [`ContentService`] from configuration and a source factory.
///
/// # Errors
///
/// Same as [`build_fetcher`].
pub fn build_service<F>(cfg: &AggregatorConfig, source_factory: F) -> Result<ContentService<FallbackFetcher>, ConfigError>
where
    F: FnMut(&SourceId) -> Result<Arc<dyn ContentSource>, ConfigError>,
{
    let fetcher = build_fetcher(cfg, source_factory)?;
    info!(
        slots = cfg.schedule.len(),
        sources = fetcher.registry().len(),
        max_workers = cfg.max_workers,
        request_timeout_ms = cfg.request_timeout_ms,
        "Content service built"
    );
    Ok(ContentService::new(cfg.clone(), fetcher))
}

/// Build a service over an existing registry.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownSource`] if the schedule names a source the
/// registry lacks, or any validation error.
pub fn build_service_with_registry(
    cfg: &AggregatorConfig,
    registry: &SourceRegistry,
) -> Result<ContentService<FallbackFetcher>, ConfigError> {
    build_service(cfg, |id| {
        registry
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSource(id.clone()))
    })
}
