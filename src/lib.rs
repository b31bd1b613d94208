//! Multi-listener HTTP server supervisor library.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::SupervisorConfig;
pub use error::SupervisorError;
pub use lifecycle::{launch, SupervisionGroup};
