//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraints::builtin::DEFAULT_VERSION_HEADER;
use crate::routing::FallbackPolicy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Constraint engine settings.
    pub router: RouterConfig,

    /// Header-derived custom constraint dimensions.
    pub strategies: Vec<StrategyConfig>,

    /// Route definitions.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Constraint engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Behavior when constraint values were supplied but nothing matched.
    pub fallback: FallbackPolicy,

    /// Allow `[[strategies]]` entries named `host` or `version`.
    pub allow_builtin_override: bool,

    /// Request header the `version` dimension is derived from.
    pub version_header: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::Strict,
            allow_builtin_override: false,
            version_header: DEFAULT_VERSION_HEADER.to_string(),
        }
    }
}

/// A custom exact-match dimension whose value comes from a header.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Dimension name used in route `constraints`.
    pub name: String,

    /// Request header the value is read from.
    pub header: String,
}

/// A route and the static response it serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging and the `x-route` header.
    pub name: String,

    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,

    /// Exact request path.
    pub path: String,

    /// Dimension name → registered value.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,

    /// Response status code.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response body.
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}
