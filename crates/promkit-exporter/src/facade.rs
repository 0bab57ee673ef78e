//! The `Metrics` facade.
//!
//! Every update goes through the same steps:
//! 1. reject caller labels named `app`/`env`;
//! 2. add the service tags `app=<app_name>`, `env=<environment>`;
//! 3. reject label names that fail the naming pattern;
//! 4. look up or create the instrument (schema = label names of the first call);
//! 5. apply the update.
//!
//! Any failure along the way comes back as `MetricsError::Update` built by the
//! `ErrorReporter`; nothing panics across this boundary.
//!
//! Gauge rule: the first write to a newly created gauge is an `add`, every
//! later write is a `set`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Instant;

use prometheus::{CounterVec, GaugeVec, HistogramVec};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use promkit_core::error::{ErrorCode, Result};
use promkit_core::exposition::grep_lines;
use promkit_core::labels::LabelSet;
use promkit_core::time_unit::TimeUnit;

use crate::config::MetricsConfig;
use crate::measure::MeasureExecTime;
use crate::obs::{ExpositionRegistry, Instrument, InstrumentRegistry};
use crate::reporter::ErrorReporter;
use crate::server::{self, ServerHandle};
use crate::stats;

/// Cheap to clone; clones share registries, server and samplers.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    cfg: MetricsConfig,
    exposition: ExpositionRegistry,
    reporter: ErrorReporter<ExpositionRegistry>,
    counters: InstrumentRegistry<CounterVec>,
    gauges: InstrumentRegistry<GaugeVec>,
    histograms: InstrumentRegistry<HistogramVec>,
    server: Mutex<ServerSlot>,
    shutdown: CancellationToken,
}

struct ServerSlot {
    /// Rewritten with the bound address after the first start so a restart
    /// reuses an ephemeral port.
    listen: SocketAddr,
    running: Option<ServerHandle>,
}

impl Drop for MetricsInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Handle held by background samplers; does not keep the facade alive.
#[derive(Clone)]
pub(crate) struct WeakMetrics(Weak<MetricsInner>);

impl WeakMetrics {
    pub(crate) fn upgrade(&self) -> Option<Metrics> {
        self.0.upgrade().map(|inner| Metrics { inner })
    }
}

impl Metrics {
    /// Validate `cfg` and build an empty facade. No server is started.
    pub fn new(cfg: MetricsConfig) -> Result<Self> {
        cfg.validate()?;
        let listen = cfg.listen_addr()?;
        let exposition = ExpositionRegistry::new();

        Ok(Self {
            inner: Arc::new(MetricsInner {
                reporter: ErrorReporter::new(exposition.clone()),
                counters: InstrumentRegistry::new(exposition.clone()),
                gauges: InstrumentRegistry::new(exposition.clone()),
                histograms: InstrumentRegistry::new(exposition.clone()),
                exposition,
                server: Mutex::new(ServerSlot {
                    listen,
                    running: None,
                }),
                shutdown: CancellationToken::new(),
                cfg,
            }),
        })
    }

    /// Build, start the HTTP server and the configured stat samplers.
    pub async fn start(cfg: MetricsConfig) -> Result<Self> {
        let metrics = Self::new(cfg)?;
        metrics.start_http_server().await?;
        metrics.start_stat_reporters();
        Ok(metrics)
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.inner.cfg
    }

    pub fn app(&self) -> &str {
        &self.inner.cfg.app_name
    }

    pub fn env(&self) -> &str {
        &self.inner.cfg.environment
    }

    // --------------------
    // Updates
    // --------------------

    /// Add `delta` (>= 0) to the counter `name`.
    ///
    /// A negative or NaN delta is rejected before the counter is looked up, so
    /// it never creates the counter or fixes its label names.
    pub fn counter(&self, name: &str, labels: &LabelSet, delta: f64) -> Result<()> {
        // The backend only debug-asserts on this.
        if delta < 0.0 || delta.is_nan() {
            return Err(self.inner.reporter.report(
                ErrorCode::Validation,
                format!("counter cannot decrease in value (delta {delta})"),
                name,
                labels.names(),
            ));
        }
        self.apply(&self.inner.counters, name, labels, &(), |vec, _, map| {
            vec.get_metric_with(map)?.inc_by(delta);
            Ok(())
        })
    }

    /// Record `value` on the gauge `name`: `add` on the write that creates the
    /// gauge, `set` afterwards.
    ///
    /// When two threads race on the very first write, the creator's `add` may
    /// land after the other thread's `set`, leaving the sum of both values
    /// until the next write.
    pub fn gauge(&self, name: &str, labels: &LabelSet, value: f64) -> Result<()> {
        self.apply(&self.inner.gauges, name, labels, &(), |vec, created, map| {
            let gauge = vec.get_metric_with(map)?;
            if created {
                gauge.add(value);
            } else {
                gauge.set(value);
            }
            Ok(())
        })
    }

    /// Observe `value` on the histogram `name`. `buckets` only matter on the
    /// call that creates the histogram; empty means the default linear buckets.
    pub fn histogram(
        &self,
        name: &str,
        labels: &LabelSet,
        value: f64,
        buckets: &[f64],
    ) -> Result<()> {
        self.apply(&self.inner.histograms, name, labels, buckets, |vec, _, map| {
            vec.get_metric_with(map)?.observe(value);
            Ok(())
        })
    }

    /// Observe the seconds elapsed since `since` on the histogram `name`.
    pub fn elapsed_time(
        &self,
        name: &str,
        labels: &LabelSet,
        since: Instant,
        buckets: &[f64],
    ) -> Result<()> {
        self.histogram(name, labels, since.elapsed().as_secs_f64(), buckets)
    }

    /// Start timing; [`MeasureExecTime::stop`] records the elapsed time in
    /// `unit` on the histogram `name`.
    pub fn start_measure_exec_time(
        &self,
        name: &str,
        labels: LabelSet,
        buckets: Vec<f64>,
        unit: TimeUnit,
    ) -> MeasureExecTime {
        MeasureExecTime::start(self.clone(), name, labels, buckets, unit)
    }

    fn apply<I, F>(
        &self,
        registry: &InstrumentRegistry<I>,
        name: &str,
        labels: &LabelSet,
        config: &I::Config,
        update: F,
    ) -> Result<()>
    where
        I: Instrument,
        F: FnOnce(&I, bool, &HashMap<&str, &str>) -> prometheus::Result<()>,
    {
        let inner = &self.inner;
        // Reports carry the caller's names; the schema uses the tagged ones.
        let input_names = labels.names();

        if let Some(reserved) = labels.reserved_collision() {
            return Err(inner.reporter.report(
                ErrorCode::ReservedLabel,
                format!("label name '{reserved}' is reserved for service tags"),
                name,
                input_names,
            ));
        }

        let tagged = labels.augment(&inner.cfg.app_name, &inner.cfg.environment);

        if let Some(bad) = tagged.first_invalid_name() {
            return Err(inner.reporter.report(
                ErrorCode::InvalidLabelName,
                format!("'{bad}' is not a valid label name"),
                name,
                input_names,
            ));
        }

        registry
            .get_or_create(name, &tagged.names(), config)
            .and_then(|(instrument, created)| update(&instrument, created, &tagged.as_map()))
            .map_err(|e| inner.reporter.report_backend(&e, name, input_names))
    }

    // --------------------
    // Reading
    // --------------------

    /// Full exposition text, as served on the metrics endpoint.
    pub fn exposition_text(&self) -> Result<String> {
        self.inner.exposition.render()
    }

    /// Exposition lines containing `filter` (case-insensitive).
    pub fn get_metrics(&self, filter: &str) -> Result<String> {
        Ok(grep_lines(filter, &self.exposition_text()?))
    }

    /// Names registered per kind: (counters, gauges, histograms).
    pub fn registered(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        (
            self.inner.counters.names(),
            self.inner.gauges.names(),
            self.inner.histograms.names(),
        )
    }

    // --------------------
    // Lifecycle
    // --------------------

    /// Bind and serve the metrics endpoint. Idempotent while running.
    pub async fn start_http_server(&self) -> Result<SocketAddr> {
        let mut slot = self.inner.server.lock().await;
        if let Some(running) = &slot.running {
            return Ok(running.local_addr());
        }

        let handle = server::spawn(
            slot.listen,
            &self.inner.cfg.metrics_endpoint,
            self.inner.cfg.debug_endpoints,
            self.inner.exposition.clone(),
        )
        .await?;
        let addr = handle.local_addr();
        slot.listen = addr;
        slot.running = Some(handle);
        Ok(addr)
    }

    /// Stop serving after in-flight requests finish. No-op when stopped.
    pub async fn stop_http_server(&self) -> Result<()> {
        let running = self.inner.server.lock().await.running.take();
        match running {
            Some(handle) => handle.stop().await,
            None => Ok(()),
        }
    }

    /// Address the server is bound to, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner
            .server
            .lock()
            .await
            .running
            .as_ref()
            .map(ServerHandle::local_addr)
    }

    /// Spawn the samplers enabled in `stats`. Returns how many were started;
    /// zero outside a tokio runtime.
    pub fn start_stat_reporters(&self) -> usize {
        stats::spawn_enabled(self)
    }

    /// Stop samplers and the HTTP server.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.shutdown.cancel();
        self.stop_http_server().await
    }

    pub(crate) fn cancellation(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub(crate) fn downgrade(&self) -> WeakMetrics {
        WeakMetrics(Arc::downgrade(&self.inner))
    }
}
