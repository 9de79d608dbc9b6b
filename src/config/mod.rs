//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → compile.rs (registry + route definitions, verified by a trial build)
//!     → installed into the server's SharedRouter
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → compile.rs builds and verifies the route table
//!     → accepted tables are sent to the server, which installs them
//!     → in-flight lookups finish on the previous table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod compile;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use compile::{compile_routes, CompiledRoutes};
pub use loader::{load_config, ConfigError};
pub use watcher::{reload, ConfigWatcher};
pub use schema::{AppConfig, ObservabilityConfig, RouteConfig, RouterConfig, ServerConfig, StrategyConfig};
