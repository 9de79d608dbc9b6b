//! Constraint resolution for one path node.
//!
//! # Responsibilities
//! - Hold every route registered at one method + path
//! - Keep one store per dimension in use at the node
//! - Select the single route whose declared constraints all match
//!
//! # Algorithm
//! ```text
//! candidates = every constrained route
//! for dimension in (exact dimensions, then range dimensions):
//!     declared = candidates that declared this dimension
//!     value    = explicit value | strategy.derive(ctx) | none
//!     survivors of this dimension:
//!         candidates not declaring it
//!         + store.get(value) ∩ declared   (nothing if no value)
//! rank survivors by:
//!     1. number of declared dimensions
//!     2. store.prefer(value) per dimension, in the order above
//!        (highest satisfying version for range dimensions)
//!     3. registration order, newest first
//! no survivor: the unconstrained route, subject to FallbackPolicy
//! ```
//!
//! # Design Decisions
//! - AND semantics apply per route, over the dimensions it declared;
//!   preference never removes a route that satisfies every dimension
//! - Registering an identical constraint set twice is rejected, so ties
//!   between equally specific routes only arise from ranges or
//!   overlapping custom stores

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraints::{ConstraintStore, MatchType, Registry, Store, Strategy};
use crate::error::{RouterError, RouterResult};
use crate::routing::context::{Constraints, RequestContext};
use crate::routing::mask::RouteMask;

/// What a lookup does when constraint values were obtained but no
/// constrained route matched them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Hard miss.
    #[default]
    Strict,
    /// Serve the unconstrained route, if the node has one.
    Unconstrained,
}

/// A constrained route occupying one slot.
#[derive(Debug)]
struct Slot<H> {
    constraints: Constraints,
    handler: H,
    seq: u64,
}

/// One dimension in use at the node.
#[derive(Debug)]
struct Dimension {
    strategy: Strategy,
    store: Store,
    /// Registered value → routes declaring it.
    values: BTreeMap<String, RouteMask>,
    /// Every route declaring this dimension.
    declared: RouteMask,
}

impl Dimension {
    fn new(strategy: Strategy) -> Self {
        let store = strategy.storage();
        Self {
            strategy,
            store,
            values: BTreeMap::new(),
            declared: RouteMask::new(),
        }
    }

    fn insert(&mut self, value: &str, slot: usize) {
        let entry = self.values.entry(value.to_string()).or_default();
        entry.insert(slot);
        self.store.set(value, entry.clone());
        self.declared.insert(slot);
    }

    fn remove(&mut self, value: &str, slot: usize) {
        if let Some(entry) = self.values.get_mut(value) {
            entry.remove(slot);
            if entry.is_empty() {
                self.values.remove(value);
                self.store.del(value);
            } else {
                self.store.set(value, entry.clone());
            }
        }
        self.declared.remove(slot);
    }

    fn is_unused(&self) -> bool {
        self.declared.is_empty()
    }
}

/// Every route registered at one path node, with the stores needed to
/// choose between them.
#[derive(Debug)]
pub struct ConstraintSet<H> {
    slots: Vec<Option<Slot<H>>>,
    dimensions: BTreeMap<String, Dimension>,
    unconstrained: Option<H>,
    next_seq: u64,
}

impl<H> Default for ConstraintSet<H> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            dimensions: BTreeMap::new(),
            unconstrained: None,
            next_seq: 0,
        }
    }
}

impl<H> ConstraintSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of routes, constrained or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count() + usize::from(self.unconstrained.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension names currently in use at this node.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn unconstrained(&self) -> Option<&H> {
        self.unconstrained.as_ref()
    }

    /// Registers a route.
    pub fn add_route(&mut self, registry: &Registry, constraints: &Constraints, handler: H) -> RouterResult<()> {
        if constraints.is_empty() {
            if self.unconstrained.is_some() {
                return Err(RouterError::DuplicateRoute);
            }
            self.unconstrained = Some(handler);
            return Ok(());
        }

        let normalized = registry.normalize(constraints)?;
        if self.find_slot(&normalized).is_some() {
            return Err(RouterError::DuplicateConstraintValue(describe(&normalized)));
        }
        for (name, value) in &normalized {
            let checked = match self.dimensions.get(name) {
                Some(dimension) => dimension.store.validate(value),
                None => registry.resolve(name)?.storage().validate(value),
            };
            checked.map_err(|reason| RouterError::InvalidConstraintValue {
                name: name.clone(),
                value: value.clone(),
                reason,
            })?;
        }

        let slot = match self.slots.iter().position(Option::is_none) {
            Some(free) => free,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        for (name, value) in &normalized {
            let strategy = registry.resolve(name)?;
            self.dimensions
                .entry(name.clone())
                .or_insert_with(|| Dimension::new(strategy.clone()))
                .insert(value, slot);
        }

        self.slots[slot] = Some(Slot {
            constraints: normalized,
            handler,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Removes the route registered with exactly these constraints.
    pub fn del_route(&mut self, registry: &Registry, constraints: &Constraints) -> RouterResult<Option<H>> {
        if constraints.is_empty() {
            return Ok(self.unconstrained.take());
        }

        let normalized = registry.normalize(constraints)?;
        let Some(index) = self.find_slot(&normalized) else {
            return Ok(None);
        };
        let Some(slot) = self.slots[index].take() else {
            return Ok(None);
        };

        for (name, value) in &slot.constraints {
            let unused = match self.dimensions.get_mut(name) {
                Some(dimension) => {
                    dimension.remove(value, index);
                    dimension.is_unused()
                }
                None => false,
            };
            if unused {
                if let Some(mut dimension) = self.dimensions.remove(name) {
                    dimension.store.empty();
                    tracing::trace!(constraint = %name, "Dropped unused constraint store");
                }
            }
        }

        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        Ok(Some(slot.handler))
    }

    /// Selects the handler for a lookup.
    ///
    /// `values` are explicit runtime values and take precedence; when a
    /// dimension has none and `ctx` is given, the strategy derives one.
    pub fn resolve(
        &self,
        registry: &Registry,
        values: &Constraints,
        ctx: Option<&RequestContext>,
        fallback: FallbackPolicy,
    ) -> RouterResult<Option<&H>> {
        for name in values.keys() {
            registry.resolve(name)?;
        }

        if self.dimensions.is_empty() {
            return Ok(self.unconstrained.as_ref());
        }

        let mut candidates: RouteMask = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect();
        let mut supplied = false;
        let mut obtained = Vec::new();

        for (name, dimension) in self.ordered_dimensions() {
            let value = match values.get(name) {
                Some(value) => Some(value.clone()),
                None => match ctx {
                    Some(ctx) => dimension.strategy.derive(ctx)?,
                    None => None,
                },
            };

            let declared = candidates.intersection(&dimension.declared);
            candidates.difference_with(&dimension.declared);
            if let Some(value) = value {
                supplied = true;
                if let Some(hit) = dimension.store.get(&value) {
                    candidates.union_with(&hit.intersection(&declared));
                }
                obtained.push((dimension, value));
            }

            tracing::trace!(constraint = %name, remaining = candidates.len(), "Checked constraint dimension");
        }

        if let Some(slot) = self.select(&candidates, &obtained) {
            return Ok(Some(&slot.handler));
        }

        if !supplied || fallback == FallbackPolicy::Unconstrained {
            return Ok(self.unconstrained.as_ref());
        }
        Ok(None)
    }

    /// Exact dimensions first, then range dimensions, each by name.
    fn ordered_dimensions(&self) -> impl Iterator<Item = (&String, &Dimension)> {
        let exact = self
            .dimensions
            .iter()
            .filter(|(_, d)| d.strategy.match_type() == MatchType::Exact);
        let range = self
            .dimensions
            .iter()
            .filter(|(_, d)| d.strategy.match_type() == MatchType::Range);
        exact.chain(range)
    }

    /// Ranks survivors: most dimensions, then store preference, then newest.
    fn select(&self, survivors: &RouteMask, obtained: &[(&Dimension, String)]) -> Option<&Slot<H>> {
        let specificity = survivors
            .iter()
            .filter_map(|i| self.slot(i))
            .map(|slot| slot.constraints.len())
            .max()?;
        let mut best: RouteMask = survivors
            .iter()
            .filter(|&i| self.slot(i).is_some_and(|slot| slot.constraints.len() == specificity))
            .collect();

        for (dimension, value) in obtained {
            let declared = best.intersection(&dimension.declared);
            if declared.is_empty() {
                continue;
            }
            let preferred = dimension.store.prefer(value, &declared);
            if preferred.is_empty() {
                continue;
            }
            best.difference_with(&dimension.declared);
            best.union_with(&preferred);
        }

        best.iter()
            .filter_map(|i| self.slot(i))
            .max_by_key(|slot| slot.seq)
    }

    fn slot(&self, index: usize) -> Option<&Slot<H>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn find_slot(&self, constraints: &Constraints) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .map(|s| &s.constraints == constraints)
                .unwrap_or(false)
        })
    }
}

fn describe(constraints: &Constraints) -> String {
    let pairs: Vec<String> = constraints
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}
