//! Logging reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                LOGGING PROXY                  │
//!    Client Request       │  ┌─────────┐    ┌───────────┐                 │
//!    ─────────────────────┼─▶│  http   │───▶│ forwarder │─────────────────┼──▶ Upstream
//!                         │  │ server  │    └─────┬─────┘                 │
//!    Client Response      │  │         │          │ incoming / outgoing   │
//!    ◀────────────────────┼──│         │◀─────────┤ / error records       │
//!                         │  └────┬────┘          ▼                       │
//!                         │       │         ┌───────────┐                 │
//!    GET /proxy-logs ─────┼───────┴────────▶│ log store │ logs/*.log      │
//!                         │                 └───────────┘                 │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use logging_proxy::config;
use logging_proxy::lifecycle::{startup, Shutdown};
use logging_proxy::observability::{logging, metrics};
use logging_proxy::{HttpServer, LogSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = config::load_from_env()?;

    logging::init_tracing(&config.observability)?;
    tracing::info!("logging-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let log_sink = Arc::new(LogSink::new(&config.log_store));
    let server = HttpServer::new(config.clone(), log_sink.clone())?;

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    startup::log_banner(&config, local_addr, log_sink.directory());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
