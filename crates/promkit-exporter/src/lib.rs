//! promkit exporter library entry.
//!
//! This crate wires the per-kind instrument registries, the error reporter,
//! the exposition HTTP server and the stat samplers into the `Metrics`
//! facade. It is consumed by the binary (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod facade;
pub mod measure;
pub mod obs;
pub mod ops;
pub mod reporter;
pub mod router;
pub mod server;
pub mod stats;

pub use facade::Metrics;
pub use measure::MeasureExecTime;
