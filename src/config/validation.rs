//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream target is a usable absolute URL
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("upstream.target '{target}' is invalid: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("upstream.{field} '{value}' is not a valid header name")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("log_store.file_prefix '{0}' must be non-empty and contain no path separators")]
    InvalidFilePrefix(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if let Err(reason) = check_target(&config.upstream.target) {
        errors.push(ValidationError::InvalidTarget {
            target: config.upstream.target.clone(),
            reason,
        });
    }

    for (field, value) in [
        ("forwarded_header", &config.upstream.forwarded_header),
        ("request_id_header", &config.upstream.request_id_header),
    ] {
        if axum::http::HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                field,
                value: value.clone(),
            });
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::NonPositive("timeouts.upstream_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::NonPositive("limits.max_body_bytes"));
    }
    if config.log_store.tail_limit == 0 {
        errors.push(ValidationError::NonPositive("log_store.tail_limit"));
    }

    let prefix = &config.log_store.file_prefix;
    if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix.starts_with('.') {
        errors.push(ValidationError::InvalidFilePrefix(prefix.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}
