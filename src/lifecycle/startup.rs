//! Startup banner.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::ProxyConfig;

/// URL an operator on this machine uses to browse the logs.
pub fn log_browse_url(local_addr: SocketAddr) -> String {
    let host = if local_addr.ip().is_unspecified() {
        "localhost".to_string()
    } else {
        match local_addr {
            SocketAddr::V4(v4) => v4.ip().to_string(),
            SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
        }
    };
    format!("http://{}:{}/proxy-logs", host, local_addr.port())
}

/// Log the port, upstream, log directory and log browsing URL.
pub fn log_banner(config: &ProxyConfig, local_addr: SocketAddr, log_dir: &Path) {
    let log_dir = absolute(log_dir);
    tracing::info!(port = local_addr.port(), "Logging proxy started on port {}", local_addr.port());
    tracing::info!(target_url = %config.upstream.target, "Proxying requests to {}", config.upstream.target);
    tracing::info!(directory = %log_dir.display(), "Logs directory: {}", log_dir.display());
    tracing::info!("View logs at: {}", log_browse_url(local_addr));
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
