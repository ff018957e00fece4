//! Configuration models for the aggregator and its request limits.

pub mod aggregator;

pub use aggregator::AggregatorConfig;
