//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//! ```
//!
//! # Design Decisions
//! - Structured events via tracing; embedders choose the subscriber
//! - Secrets never reach log fields; Debug impls expose public halves only

pub mod logging;
