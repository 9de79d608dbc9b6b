//! Error definitions for route registration and lookup.
//!
//! # Design Decisions
//! - Every registration error is raised synchronously by the call that caused it
//! - "No handler satisfies the constraints" is not an error; lookups return `None`
//! - Derivation failures carry the dimension name and the strategy's own error

use thiserror::Error;

/// Error produced by a strategy while deriving a value from a request.
pub type DeriveError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the constraint engine and the route table.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A registration or lookup named a dimension with no registered strategy.
    #[error("unknown constraint: {0}")]
    UnknownConstraint(String),

    /// A strategy name collides with an existing, non-overridable strategy.
    #[error("constraint strategy already registered: {0}")]
    DuplicateConstraintName(String),

    /// A constrained route with an identical constraint set already exists.
    #[error("a route with constraints {0} is already registered")]
    DuplicateConstraintValue(String),

    /// A second unconstrained route for the same method and path.
    #[error("an unconstrained route is already registered")]
    DuplicateRoute,

    /// A registered value the dimension's strategy cannot store.
    #[error("invalid value {value:?} for constraint {name}: {reason}")]
    InvalidConstraintValue {
        name: String,
        value: String,
        reason: String,
    },

    /// A strategy failed while deriving its value from the request.
    #[error("failed to derive constraint {name}: {source}")]
    Derive {
        name: String,
        #[source]
        source: DeriveError,
    },

    /// A method string that is not a valid HTTP method token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
}

/// Result type for routing operations.
pub type RouterResult<T> = Result<T, RouterError>;

impl RouterError {
    /// True for errors caused by the incoming request rather than the route table.
    pub fn is_request_error(&self) -> bool {
        matches!(self, RouterError::Derive { .. })
    }
}
