//! Launching listeners from server configurations.
//!
//! # Responsibilities
//! - Build the authenticator and TLS config for each server configuration
//! - Wrap the base handler with authentication
//! - Register a serve task and a close task per listen address
//!
//! # Design Decisions
//! - Fail fast: a construction error stops the launch at that configuration
//! - Listeners registered for earlier configurations keep running; the caller
//!   owns the group and decides whether to cancel it
//! - Never waits for serving; the registered tasks run for the group's lifetime

use std::sync::Arc;

use axum::Router;

use crate::auth::{AuthenticatingLayer, AuthenticatorFactory};
use crate::config::ServerConfiguration;
use crate::error::SupervisorError;
use crate::lifecycle::group::SupervisionGroup;
use crate::net::{new_tls_config, ListenerHandle, ListenerUnit, ServeOutcome};

/// Spawn one listener per configured address into `group`.
///
/// Returns a handle per listener, in configuration order. Only loading TLS
/// material is awaited here.
pub async fn launch<A>(
    configurations: &[ServerConfiguration],
    base_handler: Router,
    group: &SupervisionGroup,
    authenticator_factory: &A,
) -> Result<Vec<ListenerHandle>, SupervisorError>
where
    A: AuthenticatorFactory + ?Sized,
{
    let mut handles = Vec::new();

    for (index, configuration) in configurations.iter().enumerate() {
        let authenticator = authenticator_factory
            .new_authenticator(configuration.authentication_policy.as_ref())
            .map_err(|source| SupervisorError::Authenticator { index, source })?;
        let authenticated_handler = base_handler
            .clone()
            .layer(AuthenticatingLayer::new(authenticator));

        let tls = new_tls_config(configuration.tls.as_ref())
            .await
            .map_err(|source| SupervisorError::Transport { index, source })?;

        for address in &configuration.listen_addresses {
            let unit = Arc::new(ListenerUnit::new(
                address.clone(),
                authenticated_handler.clone(),
                tls.clone(),
            ));
            handles.push(unit.handle());
            register(group, unit);
        }

        tracing::info!(
            index,
            listeners = configuration.listen_addresses.len(),
            tls = tls.is_some(),
            "Server configuration launched"
        );
    }

    Ok(handles)
}

/// Register the close/serve task pair owning `unit`.
fn register(group: &SupervisionGroup, unit: Arc<ListenerUnit>) {
    let address = unit.address().to_string();

    {
        let unit = Arc::clone(&unit);
        let token = group.cancellation_token();
        group.spawn(format!("close {address}"), async move {
            token.cancelled().await;
            unit.close();
            Ok::<_, SupervisorError>(())
        });
    }

    group.spawn(format!("serve {address}"), async move {
        match unit.serve().await {
            Ok(ServeOutcome::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    });
}
