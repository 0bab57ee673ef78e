//! Exposition HTTP server lifecycle.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use promkit_core::error::{MetricsError, Result};

use crate::obs::ExpositionRegistry;
use crate::router;

/// A running server. Dropping the handle triggers a graceful shutdown without
/// waiting for it; [`ServerHandle::stop`] waits.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    join: JoinHandle<std::io::Result<()>>,
}

/// Bind `listen` and serve `exposition` on `metrics_endpoint` in a background task.
pub async fn spawn(
    listen: SocketAddr,
    metrics_endpoint: &str,
    debug_endpoints: bool,
    exposition: ExpositionRegistry,
) -> Result<ServerHandle> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| MetricsError::Transport(format!("bind {listen} failed: {e}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| MetricsError::Transport(format!("local_addr failed: {e}")))?;

    let app = router::build_router(metrics_endpoint, debug_endpoints, exposition);
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();

    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await
    });

    tracing::info!(%local_addr, metrics_endpoint, debug_endpoints, "metrics server started");
    Ok(ServerHandle {
        local_addr,
        shutdown,
        join,
    })
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, wait for in-flight requests, then return.
    pub async fn stop(mut self) -> Result<()> {
        self.shutdown.cancel();
        let outcome = (&mut self.join).await;
        tracing::info!(local_addr = %self.local_addr, "metrics server stopped");
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(MetricsError::Transport(format!("server failed: {e}"))),
            Err(e) => Err(MetricsError::Internal(format!("server task failed: {e}"))),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
