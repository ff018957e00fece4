//! Tests for configuration validation

use std::time::Duration;

use content_mixer::config::aggregator::{DEFAULT_MAX_WORKERS, ENV_REQUEST_TIMEOUT_MS};
use content_mixer::config::AggregatorConfig;
use content_mixer::core::{ConfigError, Schedule, SourceConfig, SourceId};

const CONFIG_JSON: &str = r#"{
    "schedule": [
        {"type": "news", "fallback": "blog"},
        {"type": "blog"},
        {"type": "video", "fallback": "news"}
    ],
    "max_workers": 4,
    "fetch_timeout_ms": 200
}"#;

#[test]
fn test_config_from_json() {
    let cfg = AggregatorConfig::from_json_str(CONFIG_JSON).unwrap();
    assert_eq!(cfg.schedule.len(), 3);
    assert_eq!(cfg.schedule.sources()[0].fallback, Some(SourceId::from("blog")));
    assert_eq!(cfg.schedule.sources()[1].fallback, None);
    assert_eq!(cfg.max_workers, 4);
    assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    assert_eq!(cfg.fetch_timeout(), Some(Duration::from_millis(200)));
}

#[test]
fn test_config_defaults_applied() {
    let cfg = AggregatorConfig::from_json_str(r#"{"schedule": [{"type": "news"}]}"#).unwrap();
    assert_eq!(cfg.max_workers, DEFAULT_MAX_WORKERS);
    assert_eq!(cfg.fetch_timeout(), None);
}

#[test]
fn test_config_empty_schedule_rejected() {
    let err = AggregatorConfig::from_json_str(r#"{"schedule": []}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref msg) if msg.contains("at least one source")));
}

#[test]
fn test_config_invalid_workers() {
    let err = AggregatorConfig::from_json_str(r#"{"schedule": [{"type": "a"}], "max_workers": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "max_workers", .. }));
}

#[test]
fn test_config_invalid_timeout() {
    let schedule = Schedule::new(vec![SourceConfig::new("a")]).unwrap();
    let cfg = AggregatorConfig::new(schedule).with_request_timeout(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let cfg = AggregatorConfig::from_json_str(CONFIG_JSON).unwrap();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains(r#""type":"news""#));
    assert!(!json.contains(r#""fallback":null"#));
    let deserialized = AggregatorConfig::from_json_str(&json).unwrap();
    assert_eq!(cfg, deserialized);
}

#[test]
fn test_config_override_timeout() {
    let cfg = AggregatorConfig::from_json_str(CONFIG_JSON)
        .unwrap()
        .with_overrides(|key| (key == ENV_REQUEST_TIMEOUT_MS).then(|| "2500".to_string()))
        .unwrap();
    assert_eq!(cfg.request_timeout(), Duration::from_millis(2500));
    assert_eq!(cfg.max_workers, 4);
}
