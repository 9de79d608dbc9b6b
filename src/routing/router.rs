//! Route table and dispatch.
//!
//! # Responsibilities
//! - Map method + path to the path node's ConstraintSet
//! - Register and remove routes
//! - Look up the handler for a request, or an explicit no-match
//!
//! # Design Decisions
//! - Paths match by exact string; pattern syntax belongs to the path tree
//! - A node's ConstraintSet is created by its first route and dropped
//!   with its last
//! - Lookups take `&self`; mutation needs `&mut self` (see `shared.rs`
//!   for the concurrent form)

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::constraints::Registry;
use crate::error::{RouterError, RouterResult};
use crate::observability::metrics;
use crate::routing::context::{Constraints, RequestContext};
use crate::routing::set::{ConstraintSet, FallbackPolicy};

/// Router-wide lookup settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    pub fallback: FallbackPolicy,
}

/// A route registration, immutable once created.
#[derive(Debug, Clone)]
pub struct RouteDefinition<H> {
    pub method: Method,
    pub path: String,
    pub constraints: Constraints,
    pub handler: H,
}

impl<H> RouteDefinition<H> {
    pub fn new(method: Method, path: impl Into<String>, constraints: Constraints, handler: H) -> Self {
        Self {
            method,
            path: path.into(),
            constraints,
            handler,
        }
    }
}

/// Parses an HTTP method name.
pub fn parse_method(method: &str) -> RouterResult<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| RouterError::InvalidMethod(method.to_string()))
}

/// Method + path table whose nodes resolve constraints.
#[derive(Debug)]
pub struct Router<H> {
    registry: Arc<Registry>,
    options: RouterOptions,
    nodes: HashMap<Method, HashMap<String, ConstraintSet<H>>>,
}

impl<H> Router<H> {
    pub fn new(registry: Arc<Registry>, options: RouterOptions) -> Self {
        Self {
            registry,
            options,
            nodes: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.nodes
            .values()
            .flat_map(|paths| paths.values())
            .map(ConstraintSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a handler for method + path under the given constraints.
    pub fn on(&mut self, method: Method, path: &str, constraints: Constraints, handler: H) -> RouterResult<()> {
        let paths = self.nodes.entry(method.clone()).or_default();
        let created = !paths.contains_key(path);
        let node = paths.entry(path.to_string()).or_insert_with(ConstraintSet::new);

        if let Err(e) = node.add_route(&self.registry, &constraints, handler) {
            tracing::warn!(%method, path, ?constraints, error = %e, "Route registration rejected");
            if created && node.is_empty() {
                paths.remove(path);
                if paths.is_empty() {
                    self.nodes.remove(&method);
                }
            }
            return Err(e);
        }

        tracing::debug!(%method, path, ?constraints, "Route registered");
        Ok(())
    }

    /// Registers a prepared definition.
    pub fn add(&mut self, definition: RouteDefinition<H>) -> RouterResult<()> {
        let RouteDefinition {
            method,
            path,
            constraints,
            handler,
        } = definition;
        self.on(method, &path, constraints, handler)
    }

    /// Removes the route registered with exactly these constraints.
    pub fn off(&mut self, method: &Method, path: &str, constraints: &Constraints) -> RouterResult<Option<H>> {
        let Some(paths) = self.nodes.get_mut(method) else {
            return Ok(None);
        };
        let Some(node) = paths.get_mut(path) else {
            return Ok(None);
        };

        let removed = node.del_route(&self.registry, constraints)?;
        if node.is_empty() {
            paths.remove(path);
        }
        if paths.is_empty() {
            self.nodes.remove(method);
        }

        if removed.is_some() {
            tracing::debug!(%method, path, ?constraints, "Route removed");
        }
        Ok(removed)
    }

    /// Removes every route. Strategies stay registered.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    /// Looks up with explicit constraint values only.
    pub fn find(&self, method: &Method, path: &str, values: &Constraints) -> RouterResult<Option<&H>> {
        self.lookup(method, path, values, None)
    }

    /// Looks up deriving every constraint value from the request.
    pub fn find_request(&self, method: &Method, path: &str, ctx: &RequestContext) -> RouterResult<Option<&H>> {
        self.lookup(method, path, &Constraints::new(), Some(ctx))
    }

    /// Looks up with explicit values, deriving the rest from `ctx` when given.
    pub fn lookup(
        &self,
        method: &Method,
        path: &str,
        values: &Constraints,
        ctx: Option<&RequestContext>,
    ) -> RouterResult<Option<&H>> {
        let Some(node) = self.nodes.get(method).and_then(|paths| paths.get(path)) else {
            metrics::record_lookup("unmatched");
            return Ok(None);
        };

        let result = node.resolve(&self.registry, values, ctx, self.options.fallback);
        match &result {
            Ok(Some(_)) => metrics::record_lookup("matched"),
            Ok(None) => {
                tracing::trace!(%method, path, "No route satisfies the request constraints");
                metrics::record_lookup("unmatched");
            }
            Err(e) => {
                tracing::debug!(%method, path, error = %e, "Route lookup failed");
                metrics::record_lookup("error");
            }
        }
        result
    }
}

impl<H: Clone> Router<H> {
    /// Builds a router from definitions, stopping at the first rejected one.
    pub fn from_definitions<'a, I>(registry: Arc<Registry>, options: RouterOptions, definitions: I) -> RouterResult<Self>
    where
        I: IntoIterator<Item = &'a RouteDefinition<H>>,
        H: 'a,
    {
        let mut router = Self::new(registry, options);
        for definition in definitions {
            router.add(definition.clone())?;
        }
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::HeaderStrategy;
    use crate::routing::context::constraints;

    fn router() -> Router<&'static str> {
        let mut registry = Registry::new();
        registry
            .register(HeaderStrategy::new("requestedBy", "accept"))
            .unwrap();
        Router::new(Arc::new(registry), RouterOptions::default())
    }

    #[test]
    fn test_method_and_path_isolation() {
        let mut router = router();
        router.on(Method::GET, "/", Constraints::new(), "get-root").unwrap();
        router.on(Method::POST, "/", Constraints::new(), "post-root").unwrap();
        router.on(Method::GET, "/users", Constraints::new(), "users").unwrap();

        let none = Constraints::new();
        assert_eq!(router.find(&Method::GET, "/", &none).unwrap(), Some(&"get-root"));
        assert_eq!(router.find(&Method::POST, "/", &none).unwrap(), Some(&"post-root"));
        assert_eq!(router.find(&Method::GET, "/users", &none).unwrap(), Some(&"users"));
        assert_eq!(router.find(&Method::PUT, "/", &none).unwrap(), None);
        assert_eq!(router.find(&Method::GET, "/missing", &none).unwrap(), None);
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_rejected_first_route_leaves_no_node() {
        let mut router = router();
        let err = router
            .on(Method::GET, "/", constraints([("tenant", "acme")]), "alpha")
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownConstraint(_)));
        assert!(router.is_empty());
        assert!(router.nodes.is_empty());
    }

    #[test]
    fn test_off_then_on_restores_lookup() {
        let mut router = router();
        let alpha = constraints([("requestedBy", "curl"), ("version", "1.0.0")]);
        let beta = constraints([("requestedBy", "curl"), ("version", "2.0.0")]);
        router.on(Method::GET, "/", alpha.clone(), "alpha").unwrap();
        router.on(Method::GET, "/", beta.clone(), "beta").unwrap();

        let query = constraints([("requestedBy", "curl"), ("version", "1.x")]);
        assert_eq!(router.find(&Method::GET, "/", &query).unwrap(), Some(&"alpha"));

        assert_eq!(router.off(&Method::GET, "/", &alpha).unwrap(), Some("alpha"));
        assert_eq!(router.find(&Method::GET, "/", &query).unwrap(), None);

        router.on(Method::GET, "/", alpha, "alpha").unwrap();
        assert_eq!(router.find(&Method::GET, "/", &query).unwrap(), Some(&"alpha"));
    }

    #[test]
    fn test_off_last_route_drops_node() {
        let mut router = router();
        router.on(Method::GET, "/", Constraints::new(), "root").unwrap();
        assert_eq!(router.off(&Method::GET, "/", &Constraints::new()).unwrap(), Some("root"));
        assert!(router.nodes.is_empty());
        assert_eq!(router.off(&Method::GET, "/", &Constraints::new()).unwrap(), None);
    }

    #[test]
    fn test_reset() {
        let mut router = router();
        router.on(Method::GET, "/", constraints([("host", "fastify.io")]), "a").unwrap();
        router.reset();
        assert!(router.is_empty());
        // Strategies survive a reset.
        router.on(Method::GET, "/", constraints([("requestedBy", "curl")]), "b").unwrap();
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_find_request_derives() {
        let mut router = router();
        router
            .on(Method::GET, "/", constraints([("version", "2.0.0")]), "v2")
            .unwrap();
        let ctx = RequestContext::new().with_header("Accept-Version", "2.x");
        assert_eq!(router.find_request(&Method::GET, "/", &ctx).unwrap(), Some(&"v2"));

        let ctx = RequestContext::new().with_header("Accept-Version", "1.x");
        assert_eq!(router.find_request(&Method::GET, "/", &ctx).unwrap(), None);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method(" DELETE ").unwrap(), Method::DELETE);
        assert!(matches!(parse_method("GE T"), Err(RouterError::InvalidMethod(_))));
    }
}
