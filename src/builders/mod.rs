//! Builders to construct services from configuration.

pub mod service_builder;

pub use service_builder::{build_fetcher, build_service, build_service_with_registry};
