//! Supervisor-level error definitions.

use thiserror::Error;

use crate::auth::PolicyError;
use crate::net::listener::ListenerError;

/// Terminal outcome of a supervised fleet of listeners.
///
/// Only the first error reported into a [`SupervisionGroup`] surfaces; the
/// rest are logged and dropped.
///
/// [`SupervisionGroup`]: crate::lifecycle::SupervisionGroup
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// An authentication policy could not be turned into an authenticator.
    #[error("Failed to create authenticator for server configuration {index}: {source}")]
    Authenticator {
        index: usize,
        #[source]
        source: PolicyError,
    },

    /// TLS material for a server configuration could not be loaded.
    #[error("Failed to create TLS configuration for server configuration {index}: {source}")]
    Transport {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// A listener failed to bind or stopped serving unexpectedly.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// A supervised task panicked.
    #[error("Task {task} panicked: {message}")]
    TaskPanicked { task: String, message: String },
}
