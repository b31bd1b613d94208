//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfiguration.tls
//!     → tls.rs (PEM files → RustlsConfig, once per configuration)
//!
//! listen address + authenticated Router + RustlsConfig
//!     → listener.rs (ListenerUnit: bind, serve, close)
//!
//! Listener States:
//!     Idle → Serving → Closing → Closed
//! ```
//!
//! # Design Decisions
//! - One unit per listen address; units never share sockets
//! - TLS is optional and handled transparently by axum-server
//! - A requested close is a normal ending, never an error

pub mod listener;
pub mod tls;

pub use listener::{ListenerError, ListenerHandle, ListenerState, ListenerUnit, ServeOutcome};
pub use tls::new_tls_config;
