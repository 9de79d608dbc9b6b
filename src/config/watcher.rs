//! Route table hot reload.
//!
//! # Responsibilities
//! - Notice edits to the configuration file
//! - Load, validate and compile the new route table
//! - Forward only tables the router has accepted
//!
//! # Design Decisions
//! - The parent directory is watched, not the file, so editors that save
//!   by writing a temp file and renaming it over the original still
//!   trigger a reload
//! - A rejected edit is logged here and never reaches the server; the
//!   live table keeps serving

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::compile::{compile_routes, CompiledRoutes};
use crate::config::loader::{load_config, ConfigError};

/// Loads and compiles the route table at `path`.
pub fn reload(path: &Path) -> Result<CompiledRoutes, ConfigError> {
    let config = load_config(path)?;
    let compiled = compile_routes(&config)?;
    Ok(compiled)
}

/// True if `event` changed the file named by `path`.
fn touches(event: &Event, path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event.paths.iter().any(|changed| changed.file_name() == Some(name))
}

/// Watches the configuration file and sends every accepted route table.
pub struct ConfigWatcher {
    path: PathBuf,
    routes_tx: mpsc::UnboundedSender<CompiledRoutes>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for verified route tables.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<CompiledRoutes>) {
        let (routes_tx, routes_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                routes_tx,
            },
            routes_rx,
        )
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Starts watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = self.directory();
        let path = self.path;
        let tx = self.routes_tx;

        let mut watcher = RecommendedWatcher::new(
            {
                let path = path.clone();
                move |res: notify::Result<Event>| match res {
                    Ok(event) if touches(&event, &path) => match reload(&path) {
                        Ok(compiled) => {
                            tracing::info!(
                                path = ?path,
                                routes = compiled.definitions.len(),
                                "Route table reloaded"
                            );
                            if tx.send(compiled).is_err() {
                                tracing::debug!("Route table receiver dropped, ignoring reload");
                            }
                        }
                        Err(ConfigError::Build(e)) => {
                            tracing::error!(error = %e, "Reloaded routes rejected, keeping current route table");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current route table");
                        }
                    },
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = ?e, "Config watch error"),
                }
            },
            Config::default(),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, directory = ?directory, "Config watcher started");
        Ok(watcher)
    }
}
