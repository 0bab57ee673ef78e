//! promkit core: label sets, bucket arithmetic, exposition text reading and
//! the shared error type.
//!
//! This crate carries no runtime, transport or metrics-backend dependencies so
//! the same primitives serve the exporter, its tests, and scrape-side tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `MetricsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod buckets;
pub mod error;
pub mod exposition;
pub mod labels;
pub mod time_unit;

pub use buckets::{decimal_places, default_buckets, generate_linear_buckets, round_float};
pub use error::{ErrorCode, MetricsError, Result, UpdateFailure};
pub use exposition::{grep_lines, labels_of, parse_exposition_text, MetricFamily, MetricType};
pub use labels::LabelSet;
pub use time_unit::TimeUnit;
