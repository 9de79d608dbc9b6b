//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing produces:
//!     → logging.rs (structured events: registrations, rejections, lookups)
//!     → metrics.rs (lookup outcome counters, route table size)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG / config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Lookup-path events are `trace` level so they cost nothing by default
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder they are no-ops, which keeps the library usable standalone

pub mod logging;
pub mod metrics;
