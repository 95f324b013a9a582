//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open log store → Bind listener → Log banner
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Server stops accepting → Process exits 0
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No drain: open connections get a short grace period after the signal,
//!   then the server returns regardless

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
