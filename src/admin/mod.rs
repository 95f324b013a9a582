//! Read-only log browsing endpoints.
//!
//! `GET /proxy-logs` lists the log files and `GET /proxy-logs/{filename}`
//! returns the tail of one. Any other method on these paths is proxied.

pub mod handlers;

use axum::{routing::get, Router};

use crate::http::server::{proxy_handler, AppState};
use self::handlers::*;

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/proxy-logs", get(list_logs).fallback(proxy_handler))
        .route("/proxy-logs/{filename}", get(get_log).fallback(proxy_handler))
}
