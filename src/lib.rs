//! Logging HTTP reverse proxy library.
//!
//! Every inbound request is relayed to one fixed upstream; each exchange is
//! appended to a per-day JSON-lines log that can be browsed over HTTP.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod logstore;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logstore::LogSink;
