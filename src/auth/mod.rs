//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfiguration.authentication_policy
//!     → authenticator.rs (AuthenticatorFactory builds Arc<dyn Authenticator>)
//!     → middleware.rs (AuthenticatingLayer wraps the base Router)
//!     → every request: authenticate(headers) → 401 | inner handler
//! ```
//!
//! # Design Decisions
//! - Built once per server configuration, shared by all of its listeners
//! - Construction errors abort the launch; request-time denials never do

pub mod authenticator;
pub mod middleware;

pub use authenticator::{
    new_authenticator_from_policy, AllowAuthenticator, AuthenticationError,
    AuthenticationMetadata, Authenticator, AuthenticatorFactory, DefaultAuthenticatorFactory,
    PolicyError,
};
pub use middleware::{AuthenticatingHandler, AuthenticatingLayer};
