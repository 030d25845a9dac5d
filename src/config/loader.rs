//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a configuration from a TOML file without validating it.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Apply the service's environment variables on top of `config`.
///
/// Recognised keys: `PORT`, `SERVICE_VERSION`, `LATENCY_BASE_MS`,
/// `SUCCESS_RATE`. Empty values are ignored and so are numbers that fail to
/// parse, leaving the previous value in place.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(port) = var("PORT") {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }
    if let Some(version) = var("SERVICE_VERSION") {
        config.service.version = version;
    }
    if let Some(latency) = var("LATENCY_BASE_MS") {
        match latency.parse() {
            Ok(v) => config.service.latency_base_ms = v,
            Err(_) => tracing::warn!(value = %latency, "Ignoring unparsable LATENCY_BASE_MS"),
        }
    }
    if let Some(rate) = var("SUCCESS_RATE") {
        match rate.parse() {
            Ok(v) => config.service.success_rate = v,
            Err(_) => tracing::warn!(value = %rate, "Ignoring unparsable SUCCESS_RATE"),
        }
    }
}

/// Read the configuration file if one was given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ServiceConfig::default()),
    }
}

/// Apply the process environment and validate the result.
pub fn finalize_config(mut config: ServiceConfig) -> Result<ServiceConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
