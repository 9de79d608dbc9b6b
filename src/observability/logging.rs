//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binaries
//! - Resolve the log filter from environment and config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - A configured level applies to this crate and `tower_http`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the filter for a configured level such as `"info"`.
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("constraint_router={level},tower_http={level}").into())
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(level: &str) {
    let result = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::debug!(level, "Logging initialized");
    }
}
