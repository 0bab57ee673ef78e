//! Self-reported process statistics.
//!
//! Each enabled statistic runs as its own tokio task ticking every
//! `stats.interval_ms`, recording gauges without labels (besides the service
//! tags):
//! - `stat_threads:count`
//! - `stat_memory_usage:{total,avail,used,free,used_percent}`
//! - `stat_cpu_usage:percent` (measured over `stats.cpu_window_ms`)
//!
//! Tasks end when the facade is shut down or its last handle is dropped.
//! Update errors inside a task are logged and otherwise ignored.

pub mod sys;

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use promkit_core::labels::LabelSet;

use crate::facade::{Metrics, WeakMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampler {
    Threads,
    Memory,
    Cpu { window: Duration },
}

impl Sampler {
    pub fn as_str(self) -> &'static str {
        match self {
            Sampler::Threads => "threads",
            Sampler::Memory => "memory",
            Sampler::Cpu { .. } => "cpu",
        }
    }

    /// One round of readings as (gauge name, value).
    pub async fn sample(self) -> sys::Result<Vec<(&'static str, f64)>> {
        match self {
            Sampler::Threads => Ok(vec![("stat_threads:count", sys::thread_count()? as f64)]),
            Sampler::Memory => {
                let m = sys::memory()?;
                Ok(vec![
                    ("stat_memory_usage:total", m.total as f64),
                    ("stat_memory_usage:avail", m.available as f64),
                    ("stat_memory_usage:used", m.used as f64),
                    ("stat_memory_usage:free", m.free as f64),
                    ("stat_memory_usage:used_percent", m.used_percent),
                ])
            }
            Sampler::Cpu { window } => {
                let before = sys::cpu_times()?;
                tokio::time::sleep(window).await;
                let after = sys::cpu_times()?;
                Ok(vec![("stat_cpu_usage:percent", after.percent_since(&before))])
            }
        }
    }
}

/// Samplers enabled by the facade's config.
pub fn enabled(metrics: &Metrics) -> Vec<Sampler> {
    let stats = &metrics.config().stats;
    let mut out = Vec::new();
    if stats.thread_count {
        out.push(Sampler::Threads);
    }
    if stats.memory_usage {
        out.push(Sampler::Memory);
    }
    if stats.cpu_usage {
        out.push(Sampler::Cpu {
            window: Duration::from_millis(stats.cpu_window_ms),
        });
    }
    out
}

pub(crate) fn spawn_enabled(metrics: &Metrics) -> usize {
    if !metrics.config().stats.any_enabled() {
        return 0;
    }
    let samplers = enabled(metrics);
    let Ok(rt) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("stat reporters need a tokio runtime; none started");
        return 0;
    };

    let every = Duration::from_millis(metrics.config().stats.interval_ms);
    for sampler in &samplers {
        rt.spawn(run(metrics.downgrade(), metrics.cancellation(), every, *sampler));
    }
    tracing::info!(count = samplers.len(), ?every, "stat reporters started");
    samplers.len()
}

async fn run(weak: WeakMetrics, shutdown: CancellationToken, every: Duration, sampler: Sampler) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let no_labels = LabelSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let readings = tokio::select! {
            _ = shutdown.cancelled() => break,
            r = sampler.sample() => r,
        };
        let readings = match readings {
            Ok(r) => r,
            Err(sys::ProcError::Unsupported(what)) => {
                tracing::debug!(sampler = sampler.as_str(), what, "sampling unsupported; stopping");
                break;
            }
            Err(e) => {
                tracing::debug!(sampler = sampler.as_str(), error = %e, "sampling failed");
                continue;
            }
        };

        let Some(metrics) = weak.upgrade() else { break };
        for (name, value) in readings {
            if let Err(e) = metrics.gauge(name, &no_labels, value) {
                tracing::debug!(sampler = sampler.as_str(), error = %e, "stat update ignored");
            }
        }
    }

    tracing::debug!(sampler = sampler.as_str(), "stat reporter stopped");
}
