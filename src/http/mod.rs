//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, buffering)
//!     → forward.rs (log incoming, send upstream, log outcome)
//!         → request.rs (request id, header rewrites)
//!     → response.rs (relay minus hop-by-hop headers, error bodies)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, InboundRequest, ProxyError};
pub use request::RequestId;
pub use server::{AppState, HttpServer};
