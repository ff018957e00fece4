//! Tests for error types

use std::time::Duration;

use content_mixer::core::{ConfigError, FetchError, PoolError, RequestError, SourceId};

#[test]
fn test_empty_schedule_error() {
    let err = ConfigError::EmptySchedule;
    assert_eq!(format!("{}", err), "source schedule must contain at least one source");
}

#[test]
fn test_unknown_source_error() {
    let err = ConfigError::UnknownSource(SourceId::from("weather"));
    assert_eq!(format!("{}", err), "no content source registered for `weather`");
}

#[test]
fn test_request_errors() {
    assert_eq!(
        RequestError::Missing("count").to_string(),
        "missing query parameter `count`"
    );
    assert_eq!(
        RequestError::CountTooSmall(0).to_string(),
        "count must be at least 1, got 0"
    );
    assert_eq!(
        RequestError::NegativeOffset(-3).to_string(),
        "offset must not be negative, got -3"
    );
}

#[test]
fn test_fallback_error_carries_both_causes() {
    let err = FetchError::Fallback {
        source_id: SourceId::from("a"),
        fallback: SourceId::from("b"),
        primary_error: Box::new(FetchError::Source {
            source_id: SourceId::from("a"),
            reason: "connection refused".into(),
        }),
        fallback_error: Box::new(FetchError::TimedOut {
            source_id: SourceId::from("b"),
            timeout: Duration::from_millis(50),
        }),
    };
    let text = err.to_string();
    assert!(text.contains("connection refused"));
    assert!(text.contains("fallback `b`"));
    assert!(text.contains("timed out"));
    assert!(!err.is_cancellation());
    assert!(FetchError::Cancelled.is_cancellation());
}

#[test]
fn test_pool_spawn_error_has_source() {
    use std::error::Error;

    let err = PoolError::Spawn(std::io::Error::other("no threads"));
    assert_eq!(err.to_string(), "failed to spawn thread: no threads");
    assert!(err.source().is_some());
    assert!(PoolError::Stopped.source().is_none());
}
