//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the logging proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// The single upstream origin every request is relayed to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Request/response log store.
    pub log_store: LogStoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL the request path is appended to (e.g., "https://api.example.com").
    pub target: String,

    /// Maximum number of redirects the outbound client follows.
    pub max_redirects: usize,

    /// Header carrying the original client address.
    pub forwarded_header: String,

    /// Header carrying the generated request id.
    pub request_id_header: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target: "https://demo.whatap.io".to_string(),
            max_redirects: 5,
            forwarded_header: "x-forwarded-for".to_string(),
            request_id_header: "x-proxy-request-id".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one upstream exchange, in seconds.
    pub upstream_secs: u64,

    /// How long open connections may keep the process alive after a
    /// shutdown signal, in seconds. Zero stops immediately.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            shutdown_grace_secs: 1,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Which calendar a log file's date is taken from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogTimezone {
    #[default]
    Utc,
    Local,
}

impl std::str::FromStr for LogTimezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(LogTimezone::Utc),
            "local" => Ok(LogTimezone::Local),
            other => Err(format!("unknown log timezone '{}'", other)),
        }
    }
}

/// Log store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogStoreConfig {
    /// Directory holding the per-day log files.
    pub directory: String,

    /// File name prefix; files are named `<prefix>-YYYY-MM-DD.log`.
    pub file_prefix: String,

    /// Calendar used to pick the current file.
    pub timezone: LogTimezone,

    /// Records returned by the tail endpoint.
    pub tail_limit: usize,

    /// Bodies larger than this are logged as a truncated preview.
    pub max_logged_body_bytes: usize,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "proxy".to_string(),
            timezone: LogTimezone::Utc,
            tail_limit: 100,
            max_logged_body_bytes: 64 * 1024,
        }
    }
}

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Answer preflights and add permissive CORS headers to every response.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.upstream.target, "https://demo.whatap.io");
        assert_eq!(config.upstream.max_redirects, 5);
        assert_eq!(config.timeouts.upstream_secs, 30);
        assert_eq!(config.limits.max_body_bytes, 50 * 1024 * 1024);
        assert_eq!(config.log_store.tail_limit, 100);
        assert!(!config.cors.enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 9000

            [log_store]
            timezone = "local"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.log_store.timezone, LogTimezone::Local);
        assert_eq!(config.log_store.directory, "logs");
    }

    #[test]
    fn parses_enum_names_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Local".parse::<LogTimezone>(), Ok(LogTimezone::Local));
        assert!("eastern".parse::<LogTimezone>().is_err());
    }
}
