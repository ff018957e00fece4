//! Tests for the request layer

use std::sync::Arc;
use std::time::Duration;

use content_mixer::builders::build_service;
use content_mixer::config::AggregatorConfig;
use content_mixer::core::{ContentItem, ContentRequest, ContentSource, RequestError, SourceId};
use content_mixer::infra::{SampleSource, UnavailableSource};
use content_mixer::runtime::{ErrorBody, ServiceError, CONTENT_TYPE_JSON};

fn config() -> AggregatorConfig {
    AggregatorConfig::from_json_str(
        r#"{"schedule": [{"type": "a"}, {"type": "b", "fallback": "c"}, {"type": "c"}]}"#,
    )
    .unwrap()
}

fn factory(down: &'static [&'static str]) -> impl FnMut(&SourceId) -> Result<Arc<dyn ContentSource>, content_mixer::core::ConfigError> {
    move |id| -> Result<Arc<dyn ContentSource>, _> {
        if down.contains(&id.as_str()) {
            Ok(Arc::new(UnavailableSource::new(id.clone())))
        } else {
            Ok(Arc::new(SampleSource::new(id.clone())))
        }
    }
}

fn sources(body: &str) -> Vec<String> {
    let items: Vec<ContentItem> = serde_json::from_str(body).unwrap();
    items.into_iter().map(|i| i.source.to_string()).collect()
}

#[test]
fn test_handle_query_success() {
    let service = build_service(&config(), factory(&[])).unwrap();
    let resp = service.handle_query("offset=1&count=4", Some("203.0.113.9"), "127.0.0.1:5000");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, CONTENT_TYPE_JSON);
    assert_eq!(sources(&resp.body), ["b", "c", "a", "b"]);
    assert!(resp.body.contains("203.0.113.9"));
}

#[test]
fn test_handle_query_uses_fallback() {
    let service = build_service(&config(), factory(&["b"])).unwrap();
    let resp = service.handle_query("count=3&offset=0", None, "127.0.0.1:5000");
    assert_eq!(resp.status, 200);
    assert_eq!(sources(&resp.body), ["a", "c", "c"]);
}

#[test]
fn test_handle_query_truncates_at_failure() {
    let service = build_service(&config(), factory(&["c"])).unwrap();
    let resp = service.handle_query("count=6&offset=0", None, "127.0.0.1:5000");
    assert_eq!(resp.status, 200);
    // Job 2 ("c", no fallback) fails, so only jobs 0 and 1 survive.
    assert_eq!(sources(&resp.body), ["a", "b"]);
}

#[test]
fn test_handle_query_invalid_input() {
    let service = build_service(&config(), factory(&[])).unwrap();
    for query in ["", "count=0&offset=0", "count=2&offset=-1", "count=x&offset=0", "count=2"] {
        let resp = service.handle_query(query, None, "127.0.0.1:5000");
        assert_eq!(resp.status, 400, "query {query:?}");
        let body: ErrorBody = serde_json::from_str(&resp.body).unwrap();
        assert!(body.error.starts_with("invalid request"));
    }
}

#[test]
fn test_handle_query_decodes_percent_escapes() {
    let service = build_service(&config(), factory(&[])).unwrap();
    let resp = service.handle_query("count=%35&offset=0", None, "127.0.0.1:5000");
    assert_eq!(resp.status, 200);
    assert_eq!(sources(&resp.body), ["a", "b", "c", "a", "b"]);
}

#[test]
fn test_count_above_limit_rejected_without_allocating() {
    let service = build_service(&config(), factory(&[])).unwrap();
    let resp = service.handle_query("count=1000000000000000&offset=0", None, "127.0.0.1:5000");
    assert_eq!(resp.status, 400);
    let body: ErrorBody = serde_json::from_str(&resp.body).unwrap();
    assert!(body.error.contains("at most"), "error: {}", body.error);

    let service = build_service(&config().with_max_count(3), factory(&[])).unwrap();
    assert!(matches!(
        service.serve(&ContentRequest::new(4, 0, "x")),
        Err(ServiceError::InvalidInput(RequestError::CountTooLarge { count: 4, max: 3 }))
    ));
    assert_eq!(service.handle_query("count=3&offset=0", None, "x").status, 200);
}

#[test]
fn test_shutdown_rejects_requests() {
    let service = build_service(&config(), factory(&[])).unwrap();
    service.shutdown();
    service.shutdown();
    assert!(service.is_shutting_down());
    assert!(matches!(
        service.serve(&ContentRequest::new(2, 0, "x")),
        Err(ServiceError::ShuttingDown)
    ));
    assert_eq!(service.handle_query("count=2&offset=0", None, "x").status, 503);
}

#[test]
fn test_shutdown_cancels_in_flight_request() {
    let slow: Arc<dyn ContentSource> = Arc::new(SampleSource::new("a").with_latency(Duration::from_secs(5)));
    let cfg = config().with_request_timeout(Duration::from_secs(30));
    let service = build_service(&cfg, |_| Ok(Arc::clone(&slow))).unwrap();

    let handle = {
        let service = service.clone();
        std::thread::spawn(move || service.serve(&ContentRequest::new(3, 0, "x")))
    };
    std::thread::sleep(Duration::from_millis(50));
    service.shutdown();

    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ServiceError::ShuttingDown)));
}
