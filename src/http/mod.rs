//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net::listener)
//!     → auth::middleware (401 or forward)
//!     → server.rs (base Router: /healthz, /whoami, echo fallback)
//! ```

pub mod server;

pub use server::base_router;
