//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured diagnostic events on stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Operator console / log aggregation
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Diagnostic logging is separate from the request/response log store
//! - Request ID flows through every event for one exchange
//! - Metrics are cheap (atomic increments) and no-ops until installed

pub mod logging;
pub mod metrics;
