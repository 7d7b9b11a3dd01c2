//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Both endpoint URIs present and usable as http(s) bases
//! - Timeouts > 0, log level and metrics address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs after file, environment and flags have been merged

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::config::schema::SyncConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingUri { field: &'static str },

    #[error("{field} '{value}' is not a valid http(s) URI: {reason}")]
    InvalidUri {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

impl ValidationError {
    /// True for errors caused by a required URI that was never supplied.
    pub fn is_missing(&self) -> bool {
        matches!(self, ValidationError::MissingUri { .. })
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_uri("etcd.uri", &config.etcd.uri, &mut errors);
    check_uri("vulcand.uri", &config.vulcand.uri, &mut errors);

    let timeouts = [
        ("etcd.request_timeout_secs", config.etcd.request_timeout_secs),
        ("etcd.connect_timeout_secs", config.etcd.connect_timeout_secs),
        ("vulcand.request_timeout_secs", config.vulcand.request_timeout_secs),
        ("vulcand.connect_timeout_secs", config.vulcand.connect_timeout_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    let level = &config.observability.log_level;
    if tracing::Level::from_str(level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(level.clone()));
    }

    let address = &config.observability.metrics_address;
    if config.observability.metrics_enabled && address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_uri(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::MissingUri { field });
        return;
    }

    let invalid = |reason: &str| ValidationError::InvalidUri {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match Url::parse(value) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(invalid("scheme must be http or https"))
        }
        Ok(url) if url.host_str().is_none() => errors.push(invalid("missing host")),
        Ok(_) => {}
        Err(e) => errors.push(invalid(&e.to_string())),
    }
}
