//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (listener bound/closed, task failures, rejections)
//!     → logging.rs (subscriber: filter + pretty/JSON formatter)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - No metrics; errors surface through the supervision group

pub mod logging;

pub use logging::init_logging;
