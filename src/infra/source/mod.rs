//! Content source implementations.

pub mod sample;

pub use sample::{SampleSource, UnavailableSource};
