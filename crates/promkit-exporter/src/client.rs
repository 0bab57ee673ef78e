//! Scrape-side helpers: fetch exposition text over HTTP, find a free port.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};
use std::time::Duration;

use promkit_core::error::{MetricsError, Result};
use promkit_core::exposition::grep_lines;

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_BACKOFF: Duration = Duration::from_millis(20);

/// GET `http://<addr><path>` and return the body.
///
/// Connection failures are retried briefly so a server that was just spawned
/// has time to accept. An unspecified bind address (`0.0.0.0`, `::`) is
/// reached through loopback.
pub async fn fetch_exposition_text(addr: SocketAddr, path: &str) -> Result<String> {
    let url = format!("http://{}{}", connectable(addr), path);

    let mut attempt = 0;
    let resp = loop {
        attempt += 1;
        match reqwest::get(&url).await {
            Ok(resp) => break resp,
            Err(e) if e.is_connect() && attempt < CONNECT_ATTEMPTS => {
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => return Err(MetricsError::Transport(format!("GET {url} failed: {e}"))),
        }
    };

    let status = resp.status();
    if !status.is_success() {
        return Err(MetricsError::Transport(format!("GET {url} returned {status}")));
    }
    resp.text()
        .await
        .map_err(|e| MetricsError::Transport(format!("read body of {url} failed: {e}")))
}

/// [`fetch_exposition_text`] filtered to lines containing `filter`.
pub async fn fetch_metrics(addr: SocketAddr, path: &str, filter: &str) -> Result<String> {
    Ok(grep_lines(filter, &fetch_exposition_text(addr, path).await?))
}

/// Ask the OS for a TCP port that is free right now.
pub fn free_port() -> Result<u16> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .map_err(|e| MetricsError::Transport(format!("no free port: {e}")))
}

fn connectable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
