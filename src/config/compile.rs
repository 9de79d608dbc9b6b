//! Route table compilation.
//!
//! # Responsibilities
//! - Build the strategy registry from `[router]` and `[[strategies]]`
//! - Turn `[[routes]]` into route definitions serving a `RouteTarget`
//!
//! # Design Decisions
//! - Every route is checked against a scratch router before the table
//!   is handed out, so a bad config never reaches a live `SharedRouter`

use std::sync::Arc;

use crate::config::schema::AppConfig;
use crate::constraints::{HeaderStrategy, Registry};
use crate::error::RouterResult;
use crate::http::response::RouteTarget;
use crate::routing::{parse_method, RouteDefinition, Router, RouterOptions};

/// Everything needed to install a route table.
#[derive(Debug, Clone)]
pub struct CompiledRoutes {
    pub registry: Arc<Registry>,
    pub options: RouterOptions,
    pub definitions: Vec<RouteDefinition<RouteTarget>>,
}

impl CompiledRoutes {
    /// Builds a standalone router from the compiled table.
    pub fn build(&self) -> RouterResult<Router<RouteTarget>> {
        Router::from_definitions(self.registry.clone(), self.options, &self.definitions)
    }
}

/// Builds the strategy registry described by the config.
pub fn build_registry(config: &AppConfig) -> RouterResult<Registry> {
    let mut registry = Registry::new()
        .with_version_header(config.router.version_header.clone())
        .with_builtin_override(config.router.allow_builtin_override);

    for strategy in &config.strategies {
        registry.register(HeaderStrategy::new(strategy.name.clone(), strategy.header.clone()))?;
    }
    Ok(registry)
}

/// Compiles and verifies the route table described by the config.
pub fn compile_routes(config: &AppConfig) -> RouterResult<CompiledRoutes> {
    let registry = Arc::new(build_registry(config)?);
    let options = RouterOptions {
        fallback: config.router.fallback,
    };

    let mut definitions = Vec::with_capacity(config.routes.len());
    for route in &config.routes {
        definitions.push(RouteDefinition::new(
            parse_method(&route.method)?,
            route.path.clone(),
            route.constraints.clone(),
            RouteTarget {
                name: route.name.clone(),
                status: route.status,
                body: route.body.clone(),
            },
        ));
    }

    let compiled = CompiledRoutes {
        registry,
        options,
        definitions,
    };
    let router = compiled.build()?;
    tracing::debug!(routes = router.len(), strategies = ?compiled.registry.names(), "Compiled route table");
    Ok(compiled)
}
