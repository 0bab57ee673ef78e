//! promkit exporter
//!
//! Serves the process's own metrics:
//! - Prometheus text on the configured endpoint (default `/metrics`)
//! - `/healthz` liveness
//! - optional thread/memory/CPU self-reporting
//!
//! Config path: first argument, or `promkit.yaml`.

use tracing_subscriber::{fmt, EnvFilter};

use promkit_core::error::{MetricsError, Result};
use promkit_exporter::{config, Metrics};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "promkit.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let metrics = Metrics::start(cfg).await?;
    if let Some(addr) = metrics.local_addr().await {
        tracing::info!(
            %addr,
            endpoint = %metrics.config().metrics_endpoint,
            app = metrics.app(),
            env = metrics.env(),
            "promkit exporter running"
        );
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| MetricsError::Internal(format!("signal handler failed: {e}")))?;

    tracing::info!("shutting down");
    metrics.shutdown().await
}
