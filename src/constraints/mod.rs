//! Constraint strategies subsystem.
//!
//! # Data Flow
//! ```text
//! Router construction:
//!     Registry::new() (built-ins: host, version)
//!     → register() custom strategies
//!     → shared via Arc by every path node
//!
//! Route registration:
//!     dimension name → registry.rs (resolve strategy)
//!     → strategy.normalize(value) → store.validate(value)
//!     → strategy.storage() (fresh store, first use at a node)
//!
//! Lookup:
//!     RequestContext → strategy.derive() → store.get() (filter)
//!     → store.prefer() (ranking among survivors)
//! ```
//!
//! # Design Decisions
//! - Built-ins are enum variants (static dispatch); user strategies
//!   plug in through `ConstraintStrategy` trait objects
//! - Derivation is synchronous and must not touch route storage
//! - Strategies are immutable once registered

pub mod builtin;
pub mod registry;
pub mod store;
pub mod version;

use std::fmt;
use std::sync::Arc;

use crate::error::{DeriveError, RouterError, RouterResult};
use crate::routing::context::RequestContext;

pub use builtin::{HeaderStrategy, HostStrategy, VersionStrategy};
pub use registry::Registry;
pub use store::{ConstraintStore, ExactStore, Store};
pub use version::{Version, VersionRange, VersionStore};

/// How a dimension compares runtime values to registered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    /// Runtime value must equal a registered value.
    Exact,
    /// Runtime value is a range containing the registered value.
    Range,
}

/// A user-defined constraint dimension.
pub trait ConstraintStrategy: Send + Sync {
    /// Unique dimension name.
    fn name(&self) -> &str;

    fn match_type(&self) -> MatchType {
        MatchType::Exact
    }

    /// A fresh, empty store for one path node.
    fn storage(&self) -> Box<dyn ConstraintStore>;

    /// The runtime value for this dimension, if the request carries one.
    fn derive(&self, _ctx: &RequestContext) -> Result<Option<String>, DeriveError> {
        Ok(None)
    }

    /// Validates a registered value and returns the form it is stored under.
    fn normalize(&self, value: &str) -> Result<String, String> {
        Ok(value.to_string())
    }
}

/// A registered strategy.
#[derive(Clone)]
pub enum Strategy {
    Host(HostStrategy),
    Version(VersionStrategy),
    Header(HeaderStrategy),
    Custom(Arc<dyn ConstraintStrategy>),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Host(s) => f.debug_tuple("Host").field(s).finish(),
            Strategy::Version(s) => f.debug_tuple("Version").field(s).finish(),
            Strategy::Header(s) => f.debug_tuple("Header").field(s).finish(),
            Strategy::Custom(s) => f.debug_tuple("Custom").field(&s.name()).finish(),
        }
    }
}

impl Strategy {
    pub fn name(&self) -> &str {
        match self {
            Strategy::Host(_) => builtin::HOST,
            Strategy::Version(_) => builtin::VERSION,
            Strategy::Header(s) => s.name(),
            Strategy::Custom(s) => s.name(),
        }
    }

    pub fn match_type(&self) -> MatchType {
        match self {
            Strategy::Version(_) => MatchType::Range,
            Strategy::Host(_) | Strategy::Header(_) => MatchType::Exact,
            Strategy::Custom(s) => s.match_type(),
        }
    }

    pub fn storage(&self) -> Store {
        match self {
            Strategy::Host(s) => s.storage(),
            Strategy::Version(s) => s.storage(),
            Strategy::Header(s) => s.storage(),
            Strategy::Custom(s) => Store::Custom(s.storage()),
        }
    }

    /// Derives the runtime value from the request.
    pub fn derive(&self, ctx: &RequestContext) -> RouterResult<Option<String>> {
        match self {
            Strategy::Host(s) => Ok(s.derive(ctx)),
            Strategy::Version(s) => Ok(s.derive(ctx)),
            Strategy::Header(s) => Ok(s.derive(ctx)),
            Strategy::Custom(s) => s.derive(ctx).map_err(|source| RouterError::Derive {
                name: s.name().to_string(),
                source,
            }),
        }
    }

    /// Validates a value at registration time.
    pub fn normalize(&self, value: &str) -> RouterResult<String> {
        let normalized = match self {
            Strategy::Version(s) => s.normalize(value),
            Strategy::Host(_) | Strategy::Header(_) => Ok(value.to_string()),
            Strategy::Custom(s) => s.normalize(value),
        };
        normalized.map_err(|reason| RouterError::InvalidConstraintValue {
            name: self.name().to_string(),
            value: value.to_string(),
            reason,
        })
    }
}

impl From<HeaderStrategy> for Strategy {
    fn from(strategy: HeaderStrategy) -> Self {
        Strategy::Header(strategy)
    }
}

impl From<VersionStrategy> for Strategy {
    fn from(strategy: VersionStrategy) -> Self {
        Strategy::Version(strategy)
    }
}

impl From<HostStrategy> for Strategy {
    fn from(strategy: HostStrategy) -> Self {
        Strategy::Host(strategy)
    }
}

impl From<Arc<dyn ConstraintStrategy>> for Strategy {
    fn from(strategy: Arc<dyn ConstraintStrategy>) -> Self {
        Strategy::Custom(strategy)
    }
}
