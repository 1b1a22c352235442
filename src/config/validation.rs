//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits ordered)
//! - Detect duplicate transports in the registry order
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
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

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if !config.listener.endpoint.starts_with('/') {
        errors.push(ValidationError::new(
            "listener.endpoint",
            "must start with '/'",
        ));
    }

    let upload = &config.upload;
    if upload.max_memory() > upload.max_upload_size() {
        errors.push(ValidationError::new(
            "upload.max_memory",
            format!(
                "{} exceeds upload.max_upload_size {}",
                upload.max_memory(),
                upload.max_upload_size()
            ),
        ));
    }

    if let Some(dir) = &upload.temp_dir {
        if !dir.is_dir() {
            errors.push(ValidationError::new(
                "upload.temp_dir",
                format!("{} is not a directory", dir.display()),
            ));
        }
    }

    if config.transports.order.is_empty() {
        errors.push(ValidationError::new(
            "transports.order",
            "at least one transport is required",
        ));
    }
    let mut seen = HashSet::new();
    for kind in &config.transports.order {
        if !seen.insert(kind) {
            errors.push(ValidationError::new(
                "transports.order",
                format!("{kind:?} listed more than once"),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
