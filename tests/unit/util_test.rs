//! Tests for schedule arithmetic, sample sources and telemetry

use content_mixer::core::{resolve_index, Schedule, SourceConfig};
use content_mixer::util::init_tracing;

#[test]
fn test_schedule_wraps_indefinitely() {
    let schedule = Schedule::new(vec![SourceConfig::new("a"), SourceConfig::new("b"), SourceConfig::new("c")]).unwrap();
    let start = schedule.start_offset(5);
    assert_eq!(start, 2);
    let picked: Vec<&str> = (0..7).map(|n| schedule.resolve(start, n).source.as_str()).collect();
    assert_eq!(picked, ["c", "a", "b", "c", "a", "b", "c"]);
    assert_eq!(resolve_index(3, start, 1_000_000).unwrap(), (2 + 1_000_000) % 3);
}

#[test]
fn test_schedule_json_is_plain_array() {
    let schedule: Schedule = serde_json::from_str(r#"[{"type": "a", "fallback": "b"}, {"type": "b"}]"#).unwrap();
    assert_eq!(schedule.len(), 2);
    let json = serde_json::to_string(&schedule).unwrap();
    assert_eq!(json, r#"[{"type":"a","fallback":"b"},{"type":"b"}]"#);
    assert!(serde_json::from_str::<Schedule>("[]").is_err());
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice");
}
