//! Concurrently readable route table.
//!
//! # Responsibilities
//! - Serve lookups from an immutable snapshot without blocking
//! - Apply registrations and removals by rebuilding and swapping
//!
//! # Design Decisions
//! - Readers `load` an `Arc<Router>` from `ArcSwap`; in-flight lookups
//!   keep the snapshot they started with
//! - Writers are serialized by a mutex over the route definitions
//! - A rejected mutation never publishes a partial table
//! - The `router_routes` gauge follows published tables only; scratch
//!   builds that get rejected never touch it

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::constraints::Registry;
use crate::error::RouterResult;
use crate::observability::metrics;
use crate::routing::context::Constraints;
use crate::routing::router::{RouteDefinition, Router, RouterOptions};

struct Table<H> {
    registry: Arc<Registry>,
    options: RouterOptions,
    definitions: Vec<RouteDefinition<H>>,
}

/// A route table shared between request handlers and an administrator.
pub struct SharedRouter<H> {
    current: ArcSwap<Router<H>>,
    table: Mutex<Table<H>>,
}

impl<H: Clone> SharedRouter<H> {
    pub fn new(registry: Arc<Registry>, options: RouterOptions) -> Self {
        Self {
            current: ArcSwap::from_pointee(Router::new(registry.clone(), options)),
            table: Mutex::new(Table {
                registry,
                options,
                definitions: Vec::new(),
            }),
        }
    }

    /// The current route table.
    pub fn snapshot(&self) -> Arc<Router<H>> {
        self.current.load_full()
    }

    /// Registered definitions, in registration order.
    pub fn definitions(&self) -> Vec<RouteDefinition<H>> {
        self.lock().definitions.clone()
    }

    /// Registers a route and publishes the new table.
    pub fn on(&self, definition: RouteDefinition<H>) -> RouterResult<()> {
        let mut table = self.lock();
        let mut definitions = table.definitions.clone();
        definitions.push(definition);

        let router = Router::from_definitions(table.registry.clone(), table.options, &definitions)?;
        table.definitions = definitions;
        self.publish(router);
        Ok(())
    }

    /// Removes a route and publishes the new table.
    pub fn off(&self, method: &Method, path: &str, constraints: &Constraints) -> RouterResult<Option<H>> {
        let mut table = self.lock();
        let wanted = table.registry.normalize(constraints)?;

        let mut index = None;
        for (i, definition) in table.definitions.iter().enumerate() {
            if &definition.method == method
                && definition.path == path
                && table.registry.normalize(&definition.constraints)? == wanted
            {
                index = Some(i);
                break;
            }
        }
        let Some(index) = index else {
            return Ok(None);
        };

        let mut definitions = table.definitions.clone();
        let removed = definitions.remove(index);
        let router = Router::from_definitions(table.registry.clone(), table.options, &definitions)?;
        table.definitions = definitions;
        self.publish(router);
        Ok(Some(removed.handler))
    }

    /// Removes every route.
    pub fn reset(&self) {
        let mut table = self.lock();
        table.definitions.clear();
        self.publish(Router::new(table.registry.clone(), table.options));
    }

    /// Replaces strategies, options and routes in one step.
    pub fn install(
        &self,
        registry: Arc<Registry>,
        options: RouterOptions,
        definitions: Vec<RouteDefinition<H>>,
    ) -> RouterResult<()> {
        let mut table = self.lock();
        let router = Router::from_definitions(registry.clone(), options, &definitions)?;
        tracing::info!(routes = router.len(), "Installed route table");
        *table = Table {
            registry,
            options,
            definitions,
        };
        self.publish(router);
        Ok(())
    }

    fn publish(&self, router: Router<H>) {
        metrics::record_routes(router.len());
        self.current.store(Arc::new(router));
    }

    fn lock(&self) -> MutexGuard<'_, Table<H>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use ::metrics::{Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};

    use crate::error::RouterError;
    use crate::routing::context::constraints;

    #[derive(Default)]
    struct RouteGauge(AtomicU64);

    impl RouteGauge {
        fn get(&self) -> f64 {
            f64::from_bits(self.0.load(Ordering::SeqCst))
        }
    }

    impl GaugeFn for RouteGauge {
        fn increment(&self, value: f64) {
            self.set(self.get() + value);
        }

        fn decrement(&self, value: f64) {
            self.set(self.get() - value);
        }

        fn set(&self, value: f64) {
            self.0.store(value.to_bits(), Ordering::SeqCst);
        }
    }

    struct RouteGaugeRecorder(Arc<RouteGauge>);

    impl Recorder for RouteGaugeRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            if key.name() == "router_routes" {
                Gauge::from_arc(self.0.clone())
            } else {
                Gauge::noop()
            }
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    fn shared() -> SharedRouter<&'static str> {
        SharedRouter::new(Arc::new(Registry::new()), RouterOptions::default())
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let router = shared();
        router
            .on(RouteDefinition::new(Method::GET, "/", constraints([("version", "1.0.0")]), "v1"))
            .unwrap();

        let before = router.snapshot();
        router
            .on(RouteDefinition::new(Method::GET, "/", constraints([("version", "2.0.0")]), "v2"))
            .unwrap();

        let query = constraints([("version", "2.x")]);
        assert_eq!(before.find(&Method::GET, "/", &query).unwrap(), None);
        assert_eq!(
            router.snapshot().find(&Method::GET, "/", &query).unwrap(),
            Some(&"v2")
        );
    }

    #[test]
    fn test_rejected_mutation_keeps_table() {
        let router = shared();
        router
            .on(RouteDefinition::new(Method::GET, "/", Constraints::new(), "root"))
            .unwrap();
        let err = router
            .on(RouteDefinition::new(Method::GET, "/", Constraints::new(), "again"))
            .unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute));
        assert_eq!(router.definitions().len(), 1);
        assert_eq!(router.snapshot().len(), 1);
    }

    #[test]
    fn test_off_matches_normalized_constraints() {
        let router = shared();
        router
            .on(RouteDefinition::new(Method::GET, "/", constraints([("version", "1.0.0")]), "v1"))
            .unwrap();

        let removed = router
            .off(&Method::GET, "/", &constraints([("version", " 1.0.0 ")]))
            .unwrap();
        assert_eq!(removed, Some("v1"));
        assert!(router.snapshot().is_empty());
        assert_eq!(router.off(&Method::GET, "/", &constraints([("version", "1.0.0")])).unwrap(), None);
    }

    #[test]
    fn test_install_and_reset() {
        let router = shared();
        let definitions = vec![
            RouteDefinition::new(Method::GET, "/", constraints([("host", "fastify.io")]), "a"),
            RouteDefinition::new(Method::GET, "/", constraints([("host", "example.io")]), "b"),
        ];
        router
            .install(Arc::new(Registry::new()), RouterOptions::default(), definitions)
            .unwrap();
        assert_eq!(router.snapshot().len(), 2);

        router.reset();
        assert!(router.snapshot().is_empty());
        assert!(router.definitions().is_empty());
    }

    #[test]
    fn test_concurrent_readers() {
        let router = Arc::new(shared());
        router
            .on(RouteDefinition::new(Method::GET, "/", constraints([("host", "fastify.io")]), "a"))
            .unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let router = router.clone();
                std::thread::spawn(move || {
                    let query = constraints([("host", "fastify.io")]);
                    for _ in 0..100 {
                        let snapshot = router.snapshot();
                        assert_eq!(snapshot.find(&Method::GET, "/", &query).unwrap(), Some(&"a"));
                    }
                })
            })
            .collect();

        for i in 0..10 {
            let host = format!("host-{i}.io");
            router
                .on(RouteDefinition::new(Method::GET, "/", constraints([("host", host)]), "other"))
                .unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(router.snapshot().len(), 11);
    }

    #[test]
    fn test_route_gauge_tracks_published_tables_only() {
        let gauge = Arc::new(RouteGauge::default());
        let recorder = RouteGaugeRecorder(gauge.clone());

        ::metrics::with_local_recorder(&recorder, || {
            let router = shared();
            router
                .on(RouteDefinition::new(Method::GET, "/", constraints([("host", "a.io")]), "a"))
                .unwrap();
            assert_eq!(gauge.get(), 1.0);

            // The scratch build holds two routes before the duplicate is rejected.
            let rejected = vec![
                RouteDefinition::new(Method::GET, "/", constraints([("host", "b.io")]), "b"),
                RouteDefinition::new(Method::GET, "/", constraints([("host", "c.io")]), "c"),
                RouteDefinition::new(Method::GET, "/", constraints([("host", "b.io")]), "again"),
            ];
            let err = router
                .install(Arc::new(Registry::new()), RouterOptions::default(), rejected)
                .unwrap_err();
            assert!(matches!(err, RouterError::DuplicateConstraintValue(_)));
            assert_eq!(gauge.get(), 1.0);
            assert_eq!(router.snapshot().len(), 1);

            router.reset();
            assert_eq!(gauge.get(), 0.0);
        });
    }
}
