//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (PROXY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT, TARGET_SERVER, ...)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to the HTTP server and log store at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{
    CorsConfig, LimitsConfig, ListenerConfig, LogFormat, LogStoreConfig, LogTimezone,
    ObservabilityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
