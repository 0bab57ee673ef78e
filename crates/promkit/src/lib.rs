//! Top-level facade crate for promkit.
//!
//! Re-exports core types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use promkit_core::*;
}

pub mod exporter {
    pub use promkit_exporter::*;
}

pub use promkit_core::{
    generate_linear_buckets, ErrorCode, LabelSet, MetricsError, Result, TimeUnit, UpdateFailure,
};
pub use promkit_exporter::config::MetricsConfig;
pub use promkit_exporter::{MeasureExecTime, Metrics};
