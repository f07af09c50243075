//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work. All problems are reported, not just the first.

use std::net::SocketAddr;

use axum::http::uri::Authority;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    let frontend = &config.frontend;
    if frontend.upstream.parse::<Authority>().is_err() {
        errors.push(ValidationError::new(
            "frontend.upstream",
            format!("`{}` is not a host:port", frontend.upstream),
        ));
    }
    if frontend.base_path.is_empty() {
        errors.push(ValidationError::new("frontend.base_path", "must not be empty"));
    }
    if frontend.index_file.is_empty() || frontend.index_file.contains(['/', '\\']) {
        errors.push(ValidationError::new(
            "frontend.index_file",
            "must be a plain file name",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
