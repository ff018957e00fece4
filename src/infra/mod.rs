//! Infrastructure adapters: concrete content sources.

pub mod source;

pub use source::{SampleSource, UnavailableSource};
