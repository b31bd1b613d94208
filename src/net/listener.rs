//! Listener units: one bound address serving one authenticated router.
//!
//! # Responsibilities
//! - Resolve and bind the configured address
//! - Serve HTTP (or HTTPS when a TLS config is present) until closed
//! - Distinguish a requested close from every other way serving can end
//! - Publish the lifecycle state for observers
//!
//! # State Transitions
//! ```text
//! Idle → Serving: bind succeeded
//! Idle → Closed: bind failed, or close requested before binding
//! Serving → Closing: close() called
//! Serving/Closing → Closed: server loop returned
//! ```
//!
//! # Design Decisions
//! - `close()` only flips a flag and signals the server handle; it is idempotent
//! - The closed flag, never the error text, decides whether an ending is graceful
//! - The TLS config is shared with the unit, never rebuilt per listener

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The address could not be resolved to a socket address.
    #[error("Failed to launch HTTP server {address:?}: invalid address: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Failed to bind to address.
    #[error("Failed to launch HTTP server {address:?}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Serving failed after a successful bind.
    #[error("HTTP server {address:?} failed: {source}")]
    Serve {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server loop returned although nobody asked it to close.
    #[error("HTTP server {address:?} stopped unexpectedly")]
    Stopped { address: String },
}

impl ListenerError {
    /// The configured address of the failing listener.
    pub fn address(&self) -> &str {
        match self {
            ListenerError::InvalidAddress { address, .. }
            | ListenerError::Bind { address, .. }
            | ListenerError::Serve { address, .. }
            | ListenerError::Stopped { address } => address,
        }
    }
}

/// Non-error result of [`ListenerUnit::serve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Serving ended because [`ListenerUnit::close`] was called.
    Closed,
}

/// Lifecycle state of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Created, not yet bound.
    Idle,
    /// Bound and accepting connections.
    Serving { local_addr: SocketAddr },
    /// Close requested, server loop still winding down.
    Closing,
    /// Socket released.
    Closed,
}

/// One configured listen address and everything needed to serve it.
pub struct ListenerUnit {
    address: String,
    handler: Router,
    tls: Option<RustlsConfig>,
    handle: Handle,
    closed: AtomicBool,
    state: watch::Sender<ListenerState>,
}

impl ListenerUnit {
    /// Create an idle unit. Nothing is bound until [`serve`](Self::serve).
    pub fn new(address: impl Into<String>, handler: Router, tls: Option<RustlsConfig>) -> Self {
        let (state, _) = watch::channel(ListenerState::Idle);
        Self {
            address: address.into(),
            handler,
            tls,
            handle: Handle::new(),
            closed: AtomicBool::new(false),
            state,
        }
    }

    /// The configured address, as written in the configuration.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Whether close has been requested.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Observer for this unit's lifecycle.
    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            address: self.address.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Bind and serve until closed.
    ///
    /// Returns `Ok(ServeOutcome::Closed)` when serving ended because of
    /// [`close`](Self::close), including when close won the race against a
    /// failing bind. Every other ending is an error.
    pub async fn serve(&self) -> Result<ServeOutcome, ListenerError> {
        if self.is_closed() {
            self.state.send_replace(ListenerState::Closed);
            return Ok(ServeOutcome::Closed);
        }

        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => return self.finish(Err(e)),
        };

        let service = self.handler.clone().into_make_service();
        let result = match &self.tls {
            Some(tls) => {
                axum_server::tls_rustls::from_tcp_rustls(listener, tls.clone())
                    .handle(self.handle.clone())
                    .serve(service)
                    .await
            }
            None => {
                axum_server::from_tcp(listener)
                    .handle(self.handle.clone())
                    .serve(service)
                    .await
            }
        };

        let result = match result {
            Ok(()) => Err(ListenerError::Stopped {
                address: self.address.clone(),
            }),
            Err(source) => Err(ListenerError::Serve {
                address: self.address.clone(),
                source,
            }),
        };
        self.finish(result)
    }

    /// Request the socket be closed. Safe to call any number of times, before,
    /// during or after [`serve`](Self::serve).
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.send_if_modified(|state| match state {
            ListenerState::Closed => false,
            _ => {
                *state = ListenerState::Closing;
                true
            }
        });
        tracing::debug!(address = %self.address, "Listener closing");
        self.handle.shutdown();
    }

    async fn bind(&self) -> Result<std::net::TcpListener, ListenerError> {
        let addr = resolve(&self.address)
            .await
            .map_err(|source| ListenerError::InvalidAddress {
                address: self.address.clone(),
                source,
            })?;

        let bind_error = |source| ListenerError::Bind {
            address: self.address.clone(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        self.state.send_if_modified(|state| match state {
            ListenerState::Idle => {
                *state = ListenerState::Serving { local_addr };
                true
            }
            _ => false,
        });

        tracing::info!(
            address = %self.address,
            local_addr = %local_addr,
            tls = self.tls.is_some(),
            "Listener bound"
        );

        listener.into_std().map_err(bind_error)
    }

    /// Close-aware mapping of how serving ended.
    fn finish(&self, result: Result<ServeOutcome, ListenerError>) -> Result<ServeOutcome, ListenerError> {
        self.state.send_replace(ListenerState::Closed);
        if self.is_closed() {
            tracing::info!(address = %self.address, "Listener closed");
            return Ok(ServeOutcome::Closed);
        }
        result
    }
}

/// Resolve a listen address. A bare `:port` means every interface.
async fn resolve(address: &str) -> io::Result<SocketAddr> {
    let host = if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    };
    let mut candidates = tokio::net::lookup_host(host).await?;
    candidates
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing"))
}

/// Read-only view of a [`ListenerUnit`]'s lifecycle.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    address: String,
    state: watch::Receiver<ListenerState>,
}

impl ListenerHandle {
    /// The configured address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Wait for the bind outcome. Returns the bound address, or `None` if the
    /// listener never started serving.
    pub async fn listening(&self) -> Option<SocketAddr> {
        let mut state = self.state.clone();
        let current = state
            .wait_for(|s| !matches!(s, ListenerState::Idle))
            .await
            .ok()?;
        match *current {
            ListenerState::Serving { local_addr } => Some(local_addr),
            _ => None,
        }
    }

    /// Wait until the socket has been released.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == ListenerState::Closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::sync::Arc;

    fn router() -> Router {
        Router::new().route("/", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn close_ends_serving_gracefully() {
        let unit = Arc::new(ListenerUnit::new("127.0.0.1:0", router(), None));
        let handle = unit.handle();

        let serving = tokio::spawn({
            let unit = unit.clone();
            async move { unit.serve().await }
        });

        let local_addr = handle.listening().await.expect("listener should bind");
        unit.close();

        let outcome = serving.await.unwrap();
        assert_eq!(outcome.unwrap(), ServeOutcome::Closed);
        assert_eq!(unit.state(), ListenerState::Closed);

        // Port is free again.
        TcpListener::bind(local_addr).await.unwrap();
    }

    #[tokio::test]
    async fn close_before_serve_never_binds() {
        let unit = ListenerUnit::new("127.0.0.1:0", router(), None);
        unit.close();
        assert_eq!(unit.state(), ListenerState::Closing);

        assert_eq!(unit.serve().await.unwrap(), ServeOutcome::Closed);
        assert_eq!(unit.handle().listening().await, None);
        assert_eq!(unit.state(), ListenerState::Closed);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let unit = Arc::new(ListenerUnit::new("127.0.0.1:0", router(), None));
        let serving = tokio::spawn({
            let unit = unit.clone();
            async move { unit.serve().await }
        });
        unit.handle().listening().await.unwrap();

        unit.close();
        unit.close();
        assert_eq!(serving.await.unwrap().unwrap(), ServeOutcome::Closed);

        unit.close();
        assert_eq!(unit.state(), ListenerState::Closed);
    }

    #[tokio::test]
    async fn occupied_address_is_bind_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = occupied.local_addr().unwrap().to_string();

        let unit = ListenerUnit::new(address.clone(), router(), None);
        let err = unit.serve().await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }), "{err}");
        assert_eq!(err.address(), address);
        assert_eq!(unit.state(), ListenerState::Closed);
    }

    #[tokio::test]
    async fn unparsable_address_is_invalid() {
        let unit = ListenerUnit::new("not an address", router(), None);
        let err = unit.serve().await.unwrap_err();
        assert!(matches!(err, ListenerError::InvalidAddress { .. }), "{err}");
    }

    #[tokio::test]
    async fn bare_port_listens_on_all_interfaces() {
        let addr = resolve(":0").await.unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 0);
    }

    #[tokio::test]
    async fn explicit_address_resolves_as_given() {
        let addr = resolve("127.0.0.1:8080").await.unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());

        let addr = resolve("localhost:0").await.unwrap();
        assert!(addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn serves_requests_while_open() {
        let unit = Arc::new(ListenerUnit::new("127.0.0.1:0", router(), None));
        let serving = tokio::spawn({
            let unit = unit.clone();
            async move { unit.serve().await }
        });
        let local_addr = unit.handle().listening().await.unwrap();

        let body = reqwest::get(format!("http://{local_addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        unit.close();
        assert!(serving.await.unwrap().is_ok());
    }
}
