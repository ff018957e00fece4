//! # Content Mixer
//!
//! A concurrent content aggregator. A request for `count` items is split into
//! one job per item, fetched round-robin from a fixed schedule of content
//! sources by a bounded pool of worker threads, and reassembled in schedule
//! order no matter which source answers first.
//!
//! ## Key Features
//!
//! - **Round-robin schedule**: job `i` is served by slot `(offset + i) mod L`
//! - **Bounded worker pool**: `min(max_workers, count)` OS threads per request,
//!   each driving async sources on its own current-thread tokio runtime
//! - **Single fallback**: a failing source is replaced by its configured
//!   fallback exactly once
//! - **First-failure truncation**: the response is always a gap-free prefix of
//!   the intended order, cut at the first job that failed
//! - **Deadlines and shutdown**: every request runs under a cancellation
//!   context; no thread outlives a request
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use content_mixer::builders::build_service;
//! use content_mixer::config::AggregatorConfig;
//! use content_mixer::infra::SampleSource;
//!
//! let cfg = AggregatorConfig::from_json_str(
//!     r#"{"schedule": [{"type": "news", "fallback": "blog"}, {"type": "blog"}]}"#,
//! )?
//! .with_env_overrides()?;
//!
//! let service = build_service(&cfg, |id| Ok(Arc::new(SampleSource::new(id.clone()))))?;
//! let response = service.handle_query("count=5&offset=0", None, "127.0.0.1:4000");
//! assert_eq!(response.status, 200);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core aggregation engine: schedule, worker pool, fallback, and ordering.
pub mod core;
/// Configuration models for the aggregator and its request limits.
pub mod config;
/// Builders to construct services from configuration.
pub mod builders;
/// Infrastructure adapters: concrete content sources.
pub mod infra;
/// Request-level API surface around the aggregation engine.
pub mod runtime;
/// Shared utilities.
pub mod util;
