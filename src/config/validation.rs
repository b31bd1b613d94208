//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate listen addresses and TLS paths are present
//! - Validate authentication policies are constructible, by building them
//! - Validate the configured log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Duplicate listen addresses are accepted; the later bind fails at runtime

use std::fmt;

use crate::auth::new_authenticator_from_policy;
use crate::config::schema::SupervisorConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "servers[1].tls.cert_path").
    pub field: String,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a configuration for semantic errors.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, server) in config.servers.iter().enumerate() {
        for (j, address) in server.listen_addresses.iter().enumerate() {
            if address.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("servers[{i}].listen_addresses[{j}]"),
                    "listen address must not be empty",
                ));
            }
        }

        if let Some(tls) = &server.tls {
            if tls.cert_path.is_empty() {
                errors.push(ValidationError::new(
                    format!("servers[{i}].tls.cert_path"),
                    "certificate path must not be empty",
                ));
            }
            if tls.key_path.is_empty() {
                errors.push(ValidationError::new(
                    format!("servers[{i}].tls.key_path"),
                    "private key path must not be empty",
                ));
            }
        }

        // Policy rules live with the authenticators; building one is the check.
        if let Some(policy) = &server.authentication_policy {
            if let Err(e) = new_authenticator_from_policy(policy) {
                errors.push(ValidationError::new(
                    format!("servers[{i}].authentication_policy"),
                    e.to_string(),
                ));
            }
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown log level {:?}", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
