//! Axum router wiring.
//!
//! Exposes the configured metrics endpoint and `/healthz`, plus the
//! `/debug/pprof/` pages when enabled.

use axum::{routing::get, Router};

use crate::{obs::ExpositionRegistry, ops};

pub fn build_router(
    metrics_endpoint: &str,
    debug_endpoints: bool,
    exposition: ExpositionRegistry,
) -> Router {
    let mut router = Router::new()
        .route(metrics_endpoint, get(ops::metrics))
        .route("/healthz", get(ops::healthz));

    if debug_endpoints {
        router = router
            .route("/debug/pprof/", get(ops::debug_index))
            .route("/debug/pprof/cmdline", get(ops::debug_cmdline))
            .route("/debug/pprof/status", get(ops::debug_status));
    }

    router.with_state(exposition)
}
