//! Per-dimension constraint storage.
//!
//! # Responsibilities
//! - Map a constraint value to the routes registered under it
//! - Answer "which routes does this runtime value select?" (`get`)
//! - Rank routes that all satisfy a value (`prefer`)
//!
//! # Design Decisions
//! - One store per (path node × dimension), owned by its ConstraintSet
//! - `get` is the match function: exact stores compare verbatim, the
//!   version store evaluates ranges
//! - Built-in stores dispatch statically; custom stores go through
//!   `Box<dyn ConstraintStore>`

use std::collections::HashMap;
use std::fmt;

use crate::constraints::version::VersionStore;
use crate::routing::mask::RouteMask;

/// Storage for one constraint dimension at one path node.
pub trait ConstraintStore: Send + Sync {
    /// Routes selected by a runtime value, or `None` if nothing matches.
    fn get(&self, value: &str) -> Option<RouteMask>;

    /// Stores the entry for a registered value, replacing any previous one.
    fn set(&mut self, value: &str, entry: RouteMask);

    /// Removes the entry for a registered value.
    fn del(&mut self, value: &str);

    /// Removes every entry.
    fn empty(&mut self);

    /// The subset of `candidates` this dimension ranks highest for a
    /// runtime value. Every candidate already satisfies `value`; this only
    /// breaks ties and never decides whether a route matches.
    fn prefer(&self, _value: &str, candidates: &RouteMask) -> RouteMask {
        candidates.clone()
    }

    /// Rejects a registered value this store cannot index.
    fn validate(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Byte-equality store used by `host` and header-derived dimensions.
#[derive(Debug, Default)]
pub struct ExactStore {
    entries: HashMap<String, RouteMask>,
}

impl ExactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConstraintStore for ExactStore {
    fn get(&self, value: &str) -> Option<RouteMask> {
        self.entries.get(value).cloned()
    }

    fn set(&mut self, value: &str, entry: RouteMask) {
        self.entries.insert(value.to_string(), entry);
    }

    fn del(&mut self, value: &str) {
        self.entries.remove(value);
    }

    fn empty(&mut self) {
        self.entries.clear();
    }
}

/// A store instance produced by a strategy.
pub enum Store {
    Exact(ExactStore),
    Version(VersionStore),
    Custom(Box<dyn ConstraintStore>),
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Exact(store) => fmt::Debug::fmt(store, f),
            Store::Version(store) => fmt::Debug::fmt(store, f),
            Store::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ConstraintStore for Store {
    fn get(&self, value: &str) -> Option<RouteMask> {
        match self {
            Store::Exact(store) => store.get(value),
            Store::Version(store) => store.get(value),
            Store::Custom(store) => store.get(value),
        }
    }

    fn set(&mut self, value: &str, entry: RouteMask) {
        match self {
            Store::Exact(store) => store.set(value, entry),
            Store::Version(store) => store.set(value, entry),
            Store::Custom(store) => store.set(value, entry),
        }
    }

    fn del(&mut self, value: &str) {
        match self {
            Store::Exact(store) => store.del(value),
            Store::Version(store) => store.del(value),
            Store::Custom(store) => store.del(value),
        }
    }

    fn empty(&mut self) {
        match self {
            Store::Exact(store) => store.empty(),
            Store::Version(store) => store.empty(),
            Store::Custom(store) => store.empty(),
        }
    }

    fn prefer(&self, value: &str, candidates: &RouteMask) -> RouteMask {
        match self {
            Store::Exact(store) => store.prefer(value, candidates),
            Store::Version(store) => store.prefer(value, candidates),
            Store::Custom(store) => store.prefer(value, candidates),
        }
    }

    fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            Store::Exact(store) => store.validate(value),
            Store::Version(store) => store.validate(value),
            Store::Custom(store) => store.validate(value),
        }
    }
}
