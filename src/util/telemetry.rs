//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "content_mixer=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, unless a subscriber is
/// already set. Safe to call more than once.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
