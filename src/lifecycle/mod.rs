//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Launch (launcher.rs):
//!     ServerConfiguration[] → authenticator + TLS config per entry
//!         → ListenerUnit per address → serve task + close task
//!
//! Supervision (group.rs):
//!     first error or external cancel → cancel group
//!         → every close task fires → every serve task returns → wait() resolves
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller cancels the group
//! ```
//!
//! # Design Decisions
//! - One cancellation signal for the whole fleet; no per-listener timeouts
//! - One fatal error stops every listener
//! - The group result is the first error, or success after a clean cancel

pub mod group;
pub mod launcher;
pub mod signals;

pub use group::SupervisionGroup;
pub use launcher::launch;
pub use signals::shutdown_signal;
