//! Execution-time measurement handle.
//!
//! `Metrics::start_measure_exec_time` captures the start instant; `stop`
//! consumes the handle and records the elapsed time as one histogram
//! observation. A handle can therefore only be stopped once, and dropping it
//! without stopping records nothing.

use std::time::Instant;

use promkit_core::error::Result;
use promkit_core::labels::LabelSet;
use promkit_core::time_unit::TimeUnit;

use crate::facade::Metrics;

#[must_use = "dropping the handle discards the measurement; call `stop`"]
pub struct MeasureExecTime {
    metrics: Metrics,
    name: String,
    labels: LabelSet,
    buckets: Vec<f64>,
    unit: TimeUnit,
    started: Instant,
}

impl MeasureExecTime {
    pub(crate) fn start(
        metrics: Metrics,
        name: &str,
        labels: LabelSet,
        buckets: Vec<f64>,
        unit: TimeUnit,
    ) -> Self {
        Self {
            metrics,
            name: name.to_string(),
            labels,
            buckets,
            unit,
            started: Instant::now(),
        }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Time since start in the handle's unit, without stopping.
    pub fn elapsed(&self) -> f64 {
        self.unit.convert(self.started.elapsed())
    }

    /// Record the elapsed time on the histogram.
    pub fn stop(self) -> Result<()> {
        let value = self.elapsed();
        tracing::trace!(metric = %self.name, value, unit = self.unit.as_str(), "exec time measured");
        self.metrics
            .histogram(&self.name, &self.labels, value, &self.buckets)
    }
}
