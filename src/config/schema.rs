//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// HTTP server definitions, launched in order.
    pub servers: Vec<ServerConfiguration>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One HTTP server definition.
///
/// Every listen address gets its own listener, all of them sharing the same
/// authentication policy and TLS settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfiguration {
    /// Addresses to listen on (e.g., "0.0.0.0:8080", "[::1]:8443", ":8080").
    pub listen_addresses: Vec<String>,

    /// Policy deciding which requests are permitted. Absent permits everything.
    pub authentication_policy: Option<AuthenticationPolicy>,

    /// Optional TLS configuration. Absent serves plaintext HTTP.
    pub tls: Option<TlsSettings>,
}

/// TLS configuration for a server.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsSettings {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Declarative authentication policy.
///
/// ```toml
/// [servers.authentication_policy.bearer_token.tokens]
/// "s3cret" = "ci-runner"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationPolicy {
    /// Permit every request.
    Allow,

    /// Reject every request with the given message.
    Deny { message: String },

    /// Permit requests carrying `Authorization: Bearer <token>` for a known
    /// token. Maps each token to the subject it authenticates.
    BearerToken { tokens: BTreeMap<String, String> },

    /// Permit if any of the nested policies permits.
    Any(Vec<AuthenticationPolicy>),

    /// Permit only if all of the nested policies permit.
    All(Vec<AuthenticationPolicy>),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
