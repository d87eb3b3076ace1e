//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (throttle limits > 0, addresses parse)
//! - Check the signing key and public URL are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AuthConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{AuthConfig, PLACEHOLDER_ADMIN_KEY, PLACEHOLDER_APP_KEY};

/// Minimum signing key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

/// A single semantic problem with a configuration.
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

pub fn validate_config(config: &AuthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.app.url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
            "app.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Ok(url) if url.path() != "/" => errors.push(ValidationError::new(
            "app.url",
            format!("must be an origin without a path, got '{}'", url.path()),
        )),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("app.url", e.to_string())),
    }

    if config.app.key == PLACEHOLDER_APP_KEY {
        errors.push(ValidationError::new("app.key", "must be set; the built-in placeholder is public"));
    } else if config.app.key.len() < MIN_KEY_LEN {
        errors.push(ValidationError::new(
            "app.key",
            format!("must be at least {MIN_KEY_LEN} bytes"),
        ));
    }
    if !config.app.home.starts_with('/') {
        errors.push(ValidationError::new("app.home", "must be an absolute path"));
    }

    for (field, value) in [
        ("provider.login", &config.provider.login),
        ("provider.register", &config.provider.register),
        ("provider.logout", &config.provider.logout),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if config.session.cookie_name.trim().is_empty() {
        errors.push(ValidationError::new("session.cookie_name", "must not be empty"));
    }

    if config.verification.max_attempts == 0 {
        errors.push(ValidationError::new("verification.max_attempts", "must be greater than 0"));
    }
    if config.verification.decay_secs == 0 {
        errors.push(ValidationError::new("verification.decay_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_ADMIN_KEY {
            errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new("admin.bind_address", "is not a socket address"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
