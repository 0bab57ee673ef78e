//! Metric storage on top of the `prometheus` crate.
//!
//! - `registry`: per-kind name -> labelled vector maps with first-use creation.
//! - `exposition`: the shared backend registry and its text rendering.

pub mod exposition;
pub mod registry;

pub use exposition::{ExpositionRegistry, ExpositionSource};
pub use registry::{Instrument, InstrumentRegistry, MetricKind};
