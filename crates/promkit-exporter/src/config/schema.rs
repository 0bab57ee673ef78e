use std::net::SocketAddr;

use serde::Deserialize;
use promkit_core::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub version: u32,

    /// Value of the `app` label on every metric.
    pub app_name: String,

    /// Value of the `env` label on every metric.
    pub environment: String,

    #[serde(default = "default_host")]
    pub host: String,

    /// 0 asks the OS for an ephemeral port.
    #[serde(default)]
    pub port: u16,

    #[serde(default = "default_metrics_endpoint")]
    pub metrics_endpoint: String,

    /// Serve process introspection pages under `/debug/pprof/`.
    #[serde(default)]
    pub debug_endpoints: bool,

    #[serde(default)]
    pub stats: StatsSection,
}

impl MetricsConfig {
    /// In-code equivalent of a minimal YAML file.
    pub fn new(app_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            version: 1,
            app_name: app_name.into(),
            environment: environment.into(),
            host: default_host(),
            port: 0,
            metrics_endpoint: default_metrics_endpoint(),
            debug_endpoints: false,
            stats: StatsSection::default(),
        }
    }

    pub fn with_listen(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(MetricsError::Config("app_name must not be empty".into()));
        }
        if self.environment.trim().is_empty() {
            return Err(MetricsError::Config("environment must not be empty".into()));
        }
        if !self.metrics_endpoint.starts_with('/') {
            return Err(MetricsError::Config(
                "metrics_endpoint must start with '/'".into(),
            ));
        }
        if self.metrics_endpoint == "/healthz" {
            return Err(MetricsError::Config(
                "metrics_endpoint must not shadow /healthz".into(),
            ));
        }
        if self.debug_endpoints && self.metrics_endpoint.starts_with("/debug/pprof/") {
            return Err(MetricsError::Config(
                "metrics_endpoint must not live under /debug/pprof/ when debug_endpoints is on"
                    .into(),
            ));
        }
        self.listen_addr()?;

        self.stats.validate()?;

        Ok(())
    }

    /// `host:port` as a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                MetricsError::Config(format!(
                    "host/port must form a valid SocketAddr ({}:{}): {e}",
                    self.host, self.port
                ))
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    #[serde(default)]
    pub thread_count: bool,

    #[serde(default)]
    pub memory_usage: bool,

    #[serde(default)]
    pub cpu_usage: bool,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// How long the CPU sampler measures before reporting.
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            thread_count: false,
            memory_usage: false,
            cpu_usage: false,
            interval_ms: default_interval_ms(),
            cpu_window_ms: default_cpu_window_ms(),
        }
    }
}

impl StatsSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.interval_ms) {
            return Err(MetricsError::Config(
                "stats.interval_ms must be between 100 and 60000".into(),
            ));
        }
        if !(10..=60000).contains(&self.cpu_window_ms) {
            return Err(MetricsError::Config(
                "stats.cpu_window_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn any_enabled(&self) -> bool {
        self.thread_count || self.memory_usage || self.cpu_usage
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_metrics_endpoint() -> String {
    "/metrics".into()
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_cpu_window_ms() -> u64 {
    1000
}
