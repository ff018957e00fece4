//! Tests for builder modules

use std::sync::Arc;

use content_mixer::builders::{build_fetcher, build_service, build_service_with_registry};
use content_mixer::config::AggregatorConfig;
use content_mixer::core::{ConfigError, ContentSource, SourceId, SourceRegistry};
use content_mixer::infra::SampleSource;

fn config() -> AggregatorConfig {
    AggregatorConfig::from_json_str(
        r#"{"schedule": [{"type": "news", "fallback": "blog"}, {"type": "blog"}, {"type": "news"}]}"#,
    )
    .unwrap()
}

fn sample(id: &SourceId) -> Result<Arc<dyn ContentSource>, ConfigError> {
    Ok(Arc::new(SampleSource::new(id.clone())))
}

#[test]
fn test_factory_called_once_per_source() {
    let mut requested = Vec::new();
    let fetcher = build_fetcher(&config(), |id| {
        requested.push(id.to_string());
        sample(id)
    })
    .unwrap();
    assert_eq!(requested, ["news", "blog"]);
    assert_eq!(fetcher.registry().len(), 2);
}

#[test]
fn test_factory_error_propagates() {
    let result = build_service(&config(), |id| {
        if id.as_str() == "blog" {
            Err(ConfigError::UnknownSource(id.clone()))
        } else {
            sample(id)
        }
    });
    assert!(matches!(result, Err(ConfigError::UnknownSource(ref id)) if id.as_str() == "blog"));
}

#[test]
fn test_unregistered_fallback_rejected() {
    let registry = SourceRegistry::new().with_source("news", Arc::new(SampleSource::new("news")));
    let result = build_service_with_registry(&config(), &registry);
    assert!(matches!(result, Err(ConfigError::UnknownSource(ref id)) if id.as_str() == "blog"));
}

#[test]
fn test_service_keeps_config() {
    let cfg = config().with_max_workers(2);
    let service = build_service(&cfg, sample).unwrap();
    assert_eq!(service.config().max_workers, 2);
    assert!(!service.is_shutting_down());
}
