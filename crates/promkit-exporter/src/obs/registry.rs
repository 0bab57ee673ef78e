//! Per-kind instrument registries.
//!
//! Each registry maps a metric name to one labelled metric vector, created on
//! first use with the label names of that first call. The schema (and, for
//! histograms, the buckets) never changes afterwards: later calls get the
//! existing vector back and their label names/buckets are ignored.
//!
//! Creation happens while holding the `DashMap` shard lock for that name, so
//! concurrent first calls build and register exactly one vector. Lookups after
//! warm-up only take the shard read lock.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use prometheus::core::Collector;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts};

use promkit_core::buckets::default_buckets;

use super::exposition::ExpositionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }

    /// Help text attached to instruments of this kind.
    pub fn help(self, name: &str) -> String {
        match self {
            MetricKind::Counter => format!("Counter for: {name}"),
            MetricKind::Gauge => format!("Gauge for: {name}"),
            MetricKind::Histogram => format!("Histogram for: {name}"),
        }
    }
}

/// A labelled metric vector the registry can build and register.
pub trait Instrument: Clone + Send + Sync + 'static {
    const KIND: MetricKind;

    /// Kind-specific creation input (bucket bounds for histograms).
    type Config: ?Sized;

    fn build(name: &str, label_names: &[&str], config: &Self::Config) -> prometheus::Result<Self>;

    fn collector(&self) -> Box<dyn Collector>;
}

impl Instrument for CounterVec {
    const KIND: MetricKind = MetricKind::Counter;
    type Config = ();

    fn build(name: &str, label_names: &[&str], _: &()) -> prometheus::Result<Self> {
        CounterVec::new(Opts::new(name, Self::KIND.help(name)), label_names)
    }

    fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.clone())
    }
}

impl Instrument for GaugeVec {
    const KIND: MetricKind = MetricKind::Gauge;
    type Config = ();

    fn build(name: &str, label_names: &[&str], _: &()) -> prometheus::Result<Self> {
        GaugeVec::new(Opts::new(name, Self::KIND.help(name)), label_names)
    }

    fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.clone())
    }
}

impl Instrument for HistogramVec {
    const KIND: MetricKind = MetricKind::Histogram;
    /// Empty means [`default_buckets`].
    type Config = [f64];

    fn build(name: &str, label_names: &[&str], buckets: &[f64]) -> prometheus::Result<Self> {
        let buckets = if buckets.is_empty() {
            default_buckets()
        } else {
            buckets.to_vec()
        };
        HistogramVec::new(
            HistogramOpts::new(name, Self::KIND.help(name)).buckets(buckets),
            label_names,
        )
    }

    fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.clone())
    }
}

pub struct InstrumentRegistry<I: Instrument> {
    instruments: DashMap<String, I>,
    exposition: ExpositionRegistry,
}

impl<I: Instrument> InstrumentRegistry<I> {
    pub fn new(exposition: ExpositionRegistry) -> Self {
        Self {
            instruments: DashMap::new(),
            exposition,
        }
    }

    /// Existing instrument for `name`, or a new one with `label_names` as its
    /// schema. The flag is `true` only for the call that created it.
    ///
    /// A failed build or registration leaves the registry untouched.
    pub fn get_or_create(
        &self,
        name: &str,
        label_names: &[String],
        config: &I::Config,
    ) -> prometheus::Result<(I, bool)> {
        if let Some(found) = self.instruments.get(name) {
            return Ok((found.value().clone(), false));
        }

        match self.instruments.entry(name.to_string()) {
            Entry::Occupied(e) => Ok((e.get().clone(), false)),
            Entry::Vacant(e) => {
                let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
                let instrument = I::build(name, &names, config)?;
                self.exposition.register(instrument.collector())?;
                tracing::debug!(
                    kind = I::KIND.as_str(),
                    metric = name,
                    labels = ?label_names,
                    "instrument created"
                );
                e.insert(instrument.clone());
                Ok((instrument, true))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.instruments.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
