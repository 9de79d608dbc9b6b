//! Constraint-routing HTTP server.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (catch-all dispatch)
//!                        │
//!                        ▼
//!                    routing::SharedRouter snapshot
//!                        │  method + path → ConstraintSet
//!                        ▼
//!                    constraints (derive host / version / custom
//!                                 values, narrow candidates)
//!                        │
//!     Client Response    ▼
//!     ◀───────────── configured status + body, `x-route` header
//!
//!     config file ──▶ config::watcher ──▶ recompiled table swapped in
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use constraint_router::config::{load_config, watcher::ConfigWatcher};
use constraint_router::http::HttpServer;
use constraint_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "constraint-router")]
#[command(about = "Serves configured routes selected by request constraints", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "constraint-router starting");
    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.server.bind_address,
        routes = config.routes.len(),
        strategies = config.strategies.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = HttpServer::new(&config)?;

    let (watcher, route_updates) = ConfigWatcher::new(&cli.config);
    // Dropping the handle stops the watch.
    let _watcher = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            None
        }
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, route_updates, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
