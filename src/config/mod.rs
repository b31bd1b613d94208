//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → servers handed to lifecycle::launch in order
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; listeners never observe changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AuthenticationPolicy;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfiguration;
pub use schema::SupervisorConfig;
pub use schema::TlsSettings;
