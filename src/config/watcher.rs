//! Hot reload of the edge configuration file.
//!
//! The file is re-read on every modify/create event. A config that fails to
//! load or validate is logged and dropped; the edge keeps serving with the
//! previous one. Editors often emit several events per save, so a config
//! equal to the last one delivered is not sent again.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::EdgeConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Keeps the file watch alive; dropping it stops reloads.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Watch `path` and stream validated configs that differ from `current`.
    pub fn spawn(
        path: &Path,
        current: EdgeConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<EdgeConfig>), notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let reloader = Reloader::new(path, current, tx);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    reloader.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching config file");
        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Loads the file and forwards new configs to the server.
struct Reloader {
    path: PathBuf,
    last: Mutex<EdgeConfig>,
    tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl Reloader {
    fn new(path: &Path, current: EdgeConfig, tx: mpsc::UnboundedSender<EdgeConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            last: Mutex::new(current),
            tx,
        }
    }

    /// Returns whether a config was sent.
    fn reload(&self) -> bool {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Config reload rejected, keeping current configuration"
                );
                return false;
            }
        };

        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *last == config {
            tracing::debug!(path = %self.path.display(), "Config unchanged");
            return false;
        }

        if self.tx.send(config.clone()).is_err() {
            tracing::warn!("Config receiver closed, dropping reload");
            return false;
        }
        tracing::info!(path = %self.path.display(), "Config reloaded");
        *last = config;
        true
    }
}
