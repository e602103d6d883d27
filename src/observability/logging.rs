//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Configure log level from the environment
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `RUST_LOG` overrides the default filter
//! - Initialization is idempotent so embedders and tests can both call it

use tracing_subscriber::EnvFilter;

/// Initialize logging with the default filter.
pub fn init() {
    init_with_filter("near_connector=info");
}

/// Initialize logging with a specific fallback filter. `RUST_LOG` wins when
/// set. Repeated calls are no-ops.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
