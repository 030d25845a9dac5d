//! Configuration validation.
//!
//! Semantic checks only; serde handles the syntax. Every problem is reported,
//! not just the first one. The success rate is intentionally left unchecked so
//! operators can simulate out-of-range behaviour.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a [`ServiceConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("service.version must not be empty")]
    EmptyVersion,

    #[error("circuit_breaker.{0} must be greater than zero")]
    NonPositive(&'static str),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.service.version.trim().is_empty() {
        errors.push(ValidationError::EmptyVersion);
    }

    let breaker = &config.circuit_breaker;
    if breaker.max_requests == 0 {
        errors.push(ValidationError::NonPositive("max_requests"));
    }
    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::NonPositive("failure_threshold"));
    }
    if breaker.timeout_secs == 0 {
        errors.push(ValidationError::NonPositive("timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.service.version = " ".into();
        config.circuit_breaker.max_requests = 0;
        config.circuit_breaker.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyVersion));
        assert!(errors.contains(&ValidationError::NonPositive("max_requests")));
        assert!(errors.contains(&ValidationError::NonPositive("timeout_secs")));
    }

    #[test]
    fn out_of_range_success_rate_is_accepted() {
        let mut config = ServiceConfig::default();
        config.service.success_rate = 1.7;
        assert!(validate_config(&config).is_ok());
    }
}
