//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, the backend client and the config watcher
//! - Bind the listener last and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Without a config file the defaults are used and hot reload is off

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::backend::{BackendError, GraphQlBackend};
use crate::config::{load_config, ConfigError, ConfigWatcher, EdgeConfig};
use crate::http::{EdgeError, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to build backend client: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to build server: {0}")]
    Server(#[from] EdgeError),

    #[error("Failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the configuration, or the defaults when no path is given.
pub fn resolve_config(path: Option<&PathBuf>) -> Result<EdgeConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(EdgeConfig::default()),
    }
}

/// Start the edge and block until it has shut down.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), StartupError> {
    let config = resolve_config(config_path.as_ref())?;
    observability::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        graphql_url = %config.backend.graphql_url,
        renderer = %config.renderer.address,
        "storefront-edge starting"
    );

    let backend = Arc::new(GraphQlBackend::new(&config.backend)?);

    // The notify handle must outlive the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::spawn(path, config.clone())?;
            (Some(watcher), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, backend)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_config_defaults() {
        assert_eq!(resolve_config(None).unwrap(), EdgeConfig::default());
    }

    #[test]
    fn test_resolve_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[renderer]\naddress = \"renderer:3000\"").unwrap();
        let config = resolve_config(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.renderer.address, "renderer:3000");
    }
}
