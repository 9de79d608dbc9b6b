//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use constraint_router::config::loader::parse_config;
use constraint_router::config::CompiledRoutes;
use constraint_router::constraints::{ConstraintStore, ConstraintStrategy, MatchType, Registry, VersionStore};
use constraint_router::error::DeriveError;
use constraint_router::http::HttpServer;
use constraint_router::routing::{RequestContext, RouteMask, Router, RouterOptions};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

/// A custom dimension keyed by the `accept` header, with its own map store.
pub struct RequestedBy;

#[derive(Default)]
struct RequestedByStore {
    entries: HashMap<String, RouteMask>,
}

impl ConstraintStore for RequestedByStore {
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

impl ConstraintStrategy for RequestedBy {
    fn name(&self) -> &str {
        "requestedBy"
    }

    fn storage(&self) -> Box<dyn ConstraintStore> {
        Box::new(RequestedByStore::default())
    }

    fn derive(&self, ctx: &RequestContext) -> Result<Option<String>, DeriveError> {
        Ok(ctx.header("accept").map(str::to_string))
    }
}

/// A second range dimension, ordered by version precedence.
#[allow(dead_code)]
pub struct ApiLevel;

impl ConstraintStrategy for ApiLevel {
    fn name(&self) -> &str {
        "api"
    }

    fn match_type(&self) -> MatchType {
        MatchType::Range
    }

    fn storage(&self) -> Box<dyn ConstraintStore> {
        Box::new(VersionStore::new())
    }
}

/// A custom dimension whose derivation always fails.
#[allow(dead_code)]
pub struct Broken;

impl ConstraintStrategy for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn storage(&self) -> Box<dyn ConstraintStore> {
        Box::new(RequestedByStore::default())
    }

    fn derive(&self, _ctx: &RequestContext) -> Result<Option<String>, DeriveError> {
        Err("derivation exploded".into())
    }
}

/// Registry with the built-ins plus `requestedBy`.
#[allow(dead_code)]
pub fn registry() -> Arc<Registry> {
    let mut registry = Registry::new();
    registry.register_custom(Arc::new(RequestedBy)).unwrap();
    Arc::new(registry)
}

#[allow(dead_code)]
pub fn router<H>() -> Router<H> {
    Router::new(registry(), RouterOptions::default())
}

/// A running server and the handles that drive it.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<CompiledRoutes>,
    pub shutdown: oneshot::Sender<()>,
    pub handle: tokio::task::JoinHandle<()>,
}

/// Starts a server for `config` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: &str) -> TestServer {
    let config = parse_config(config).unwrap();
    let server = HttpServer::new(&config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (updates, route_updates) = mpsc::unbounded_channel();
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = server
            .run(listener, route_updates, async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    TestServer {
        addr,
        updates,
        shutdown,
        handle,
    }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
