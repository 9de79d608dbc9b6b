//! Strategy registry.
//!
//! # Responsibilities
//! - Bind dimension names to strategies at router construction
//! - Reject duplicate names
//! - Guard the reserved `host` and `version` names
//!
//! # Design Decisions
//! - A built-in may be replaced once, and only when the registry was
//!   built with `allow_builtin_override`
//! - The registry is frozen behind an `Arc` once routes are registered

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::constraints::builtin::{self, HostStrategy, VersionStrategy};
use crate::constraints::{ConstraintStrategy, Strategy};
use crate::error::{RouterError, RouterResult};
use crate::routing::context::Constraints;

/// Owns every strategy known to a router.
#[derive(Debug, Clone)]
pub struct Registry {
    strategies: HashMap<String, Strategy>,
    allow_builtin_override: bool,
    overridden: HashSet<String>,
}

impl Registry {
    /// A registry holding the built-in `host` and `version` strategies.
    pub fn new() -> Self {
        let mut strategies = HashMap::new();
        strategies.insert(builtin::HOST.to_string(), Strategy::Host(HostStrategy));
        strategies.insert(
            builtin::VERSION.to_string(),
            Strategy::Version(VersionStrategy::default()),
        );
        Self {
            strategies,
            allow_builtin_override: false,
            overridden: HashSet::new(),
        }
    }

    /// Permits one replacement of each built-in strategy.
    pub fn with_builtin_override(mut self, allow: bool) -> Self {
        self.allow_builtin_override = allow;
        self
    }

    /// Derives the built-in `version` dimension from another header.
    pub fn with_version_header(mut self, header: impl Into<String>) -> Self {
        if let Some(Strategy::Version(_)) = self.strategies.get(builtin::VERSION) {
            self.strategies.insert(
                builtin::VERSION.to_string(),
                Strategy::Version(VersionStrategy::new(header)),
            );
        }
        self
    }

    pub fn is_reserved(name: &str) -> bool {
        name == builtin::HOST || name == builtin::VERSION
    }

    /// Adds a strategy.
    pub fn register(&mut self, strategy: impl Into<Strategy>) -> RouterResult<()> {
        let strategy = strategy.into();
        let name = strategy.name().to_string();

        if self.strategies.contains_key(&name) {
            let overridable = Self::is_reserved(&name)
                && self.allow_builtin_override
                && !self.overridden.contains(&name);
            if !overridable {
                tracing::warn!(constraint = %name, "Rejected duplicate constraint strategy");
                return Err(RouterError::DuplicateConstraintName(name));
            }
            tracing::info!(constraint = %name, "Overriding built-in constraint strategy");
            self.overridden.insert(name.clone());
        } else {
            tracing::debug!(constraint = %name, match_type = ?strategy.match_type(), "Registered constraint strategy");
        }

        self.strategies.insert(name, strategy);
        Ok(())
    }

    /// Adds a user-defined strategy object.
    pub fn register_custom(&mut self, strategy: Arc<dyn ConstraintStrategy>) -> RouterResult<()> {
        self.register(Strategy::Custom(strategy))
    }

    /// Looks up the strategy for a dimension.
    pub fn resolve(&self, name: &str) -> RouterResult<&Strategy> {
        self.strategies
            .get(name)
            .ok_or_else(|| RouterError::UnknownConstraint(name.to_string()))
    }

    /// Validates registered values and returns them in stored form.
    pub fn normalize(&self, constraints: &Constraints) -> RouterResult<Constraints> {
        let mut normalized = Constraints::new();
        for (name, value) in constraints {
            let strategy = self.resolve(name)?;
            normalized.insert(name.clone(), strategy.normalize(value)?);
        }
        Ok(normalized)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered dimension names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
