//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format (path configurable)
//! - `/debug/pprof/*` : process introspection, only with `debug_endpoints`

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::obs::ExpositionRegistry;
use crate::stats::sys::{self, ProcError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Pages under `/debug/pprof/`.
pub const DEBUG_PAGES: [&str; 2] = ["cmdline", "status"];

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(exposition): State<ExpositionRegistry>) -> Response {
    match exposition.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, exposition.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "render metrics failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn debug_index() -> impl IntoResponse {
    let mut body = String::new();
    for page in DEBUG_PAGES {
        body.push_str("/debug/pprof/");
        body.push_str(page);
        body.push('\n');
    }
    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN)], body)
}

/// Process arguments, NUL-separated.
pub async fn debug_cmdline() -> impl IntoResponse {
    let args: Vec<String> = std::env::args().collect();
    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN)], args.join("\0"))
}

pub async fn debug_status() -> Response {
    match sys::status_text() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response(),
        Err(e @ ProcError::Unsupported(_)) => {
            (StatusCode::NOT_IMPLEMENTED, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "read process status failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
