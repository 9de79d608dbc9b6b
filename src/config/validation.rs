//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (status codes, addresses, methods)
//! - Detect duplicate route and strategy names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Constraint-level conflicts (unknown dimensions, duplicate constraint
//!   sets) are reported by the router build, which owns those rules

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::routing::parse_method;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Checks a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("{:?} is not a socket address", config.server.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }
    if config.router.version_header.trim().is_empty() {
        errors.push(ValidationError::new("router.version_header", "must not be empty"));
    }

    let mut strategy_names = HashSet::new();
    for (i, strategy) in config.strategies.iter().enumerate() {
        let field = format!("strategies[{i}]");
        if strategy.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.name"), "must not be empty"));
        } else if !strategy_names.insert(strategy.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.name"),
                format!("duplicate strategy {:?}", strategy.name),
            ));
        }
        if strategy.header.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.header"), "must not be empty"));
        }
    }

    let mut route_names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{i}]");
        if route.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.name"), "must not be empty"));
        } else if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.name"),
                format!("duplicate route {:?}", route.name),
            ));
        }
        if parse_method(&route.method).is_err() {
            errors.push(ValidationError::new(
                format!("{field}.method"),
                format!("{:?} is not an HTTP method", route.method),
            ));
        }
        if !route.path.starts_with('/') {
            errors.push(ValidationError::new(format!("{field}.path"), "must start with '/'"));
        }
        if !(100..=599).contains(&route.status) {
            errors.push(ValidationError::new(
                format!("{field}.status"),
                format!("{} is not a valid status code", route.status),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
