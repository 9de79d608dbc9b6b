//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a catch-all dispatch handler
//! - Wire up the trace layer
//! - Dispatch every request through the constraint router
//! - Install verified route tables from the config watcher

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::config::{compile_routes, AppConfig, CompiledRoutes};
use crate::error::RouterResult;
use crate::http::response::RouteTarget;
use crate::routing::{RequestContext, SharedRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SharedRouter<RouteTarget>>,
}

/// HTTP front end for a constraint-routed table of static responses.
pub struct HttpServer {
    app: Router,
    router: Arc<SharedRouter<RouteTarget>>,
}

impl HttpServer {
    /// Create a server serving the routes in `config`.
    pub fn new(config: &AppConfig) -> RouterResult<Self> {
        let compiled = compile_routes(config)?;
        let router = Arc::new(SharedRouter::new(compiled.registry.clone(), compiled.options));
        install(&router, compiled)?;
        Ok(Self::from_shared(router))
    }

    /// Create a server over an existing route table.
    pub fn from_shared(router: Arc<SharedRouter<RouteTarget>>) -> Self {
        let state = AppState {
            router: router.clone(),
        };
        Self {
            app: Self::build_app(state),
            router,
        }
    }

    fn build_app(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The live route table.
    pub fn router(&self) -> &Arc<SharedRouter<RouteTarget>> {
        &self.router
    }

    /// Run the server until `shutdown` completes, installing route tables
    /// as they arrive.
    pub async fn run<F>(
        self,
        listener: TcpListener,
        mut route_updates: mpsc::UnboundedReceiver<CompiledRoutes>,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.router.snapshot().len(), "HTTP server starting");

        let router = self.router.clone();
        tokio::spawn(async move {
            while let Some(compiled) = route_updates.recv().await {
                if let Err(e) = install(&router, compiled) {
                    tracing::error!(error = %e, "Route table rejected at install, keeping current table");
                }
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn install(router: &SharedRouter<RouteTarget>, compiled: CompiledRoutes) -> RouterResult<()> {
    router.install(compiled.registry, compiled.options, compiled.definitions)
}

/// Resolves the request against the current route table.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let ctx = RequestContext::from(&request);
    let method = request.method();
    let path = request.uri().path();
    let table = state.router.snapshot();

    match table.find_request(method, path, &ctx) {
        Ok(Some(target)) => {
            tracing::debug!(%method, path, route = %target.name, "Route matched");
            target.into_response()
        }
        Ok(None) => {
            tracing::debug!(%method, path, "No route matched");
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
        Err(e) if e.is_request_error() => {
            tracing::warn!(%method, path, error = %e, "Rejected request");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(%method, path, error = %e, "Route lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Route lookup failed").into_response()
        }
    }
}
