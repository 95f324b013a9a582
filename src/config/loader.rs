//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "PROXY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, reason } => write!(f, "Invalid {}: {}", var, reason),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ProxyConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the runtime configuration from the process environment.
///
/// Starts from the TOML file named by `PROXY_CONFIG` (or defaults), then
/// applies the individual variable overrides and validates the result.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env`] with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_VAR) {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT`, `TARGET_SERVER` and the other recognised variables.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        config.listener.port = port.trim().parse().map_err(|e| ConfigError::Env {
            var: "PORT",
            reason: format!("{}", e),
        })?;
    }

    if let Some(target) = lookup("TARGET_SERVER") {
        config.upstream.target = target.trim().trim_end_matches('/').to_string();
    }

    if let Some(dir) = lookup("LOG_DIR") {
        config.log_store.directory = dir;
    }

    if let Some(tz) = lookup("LOG_TIMEZONE") {
        config.log_store.timezone = tz
            .parse()
            .map_err(|reason| ConfigError::Env { var: "LOG_TIMEZONE", reason })?;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = format
            .parse()
            .map_err(|reason| ConfigError::Env { var: "LOG_FORMAT", reason })?;
    }

    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }

    if let Some(flag) = lookup("CORS_ENABLED") {
        config.cors.enabled = parse_flag(&flag).ok_or_else(|| ConfigError::Env {
            var: "CORS_ENABLED",
            reason: format!("expected a boolean, got '{}'", flag),
        })?;
    }

    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
