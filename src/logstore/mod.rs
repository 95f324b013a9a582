//! Request/response log store.
//!
//! # Data Flow
//! ```text
//! Forwarder
//!     → record.rs (LogRecord: incoming / outgoing / error)
//!     → payload.rs (headers, query and body rendered as JSON)
//!     → sink.rs (one JSON line appended to logs/proxy-YYYY-MM-DD.log)
//!
//! Log browsing endpoints
//!     → sink.rs (list files, read the last N lines)
//! ```

pub mod payload;
pub mod record;
pub mod sink;

pub use record::{Direction, LogRecord};
pub use sink::{LogSink, LogStoreError, LogTail};
