//! Route file watcher for hot reload.
//!
//! # Responsibilities
//! - Watch the route file and re-read it on content changes
//! - Forward configs that parse and validate to the server
//!
//! # Design Decisions
//! - Metadata-only and access events are ignored
//! - Editors emit several events per save; a reload only happens when the
//!   file text differs from the last text that was read
//! - A file that fails to load is logged and skipped, so the running
//!   routes stay in place

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::RouterConfig;

/// Watches a route file and sends each new valid config.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

/// Remembers the last file text so repeated events collapse into one reload.
#[derive(Debug, Default)]
struct Reloader {
    last: Option<String>,
}

impl Reloader {
    fn seeded(path: &Path) -> Self {
        Self {
            last: std::fs::read_to_string(path).ok(),
        }
    }

    /// Parse `text` if it differs from the last text seen.
    fn reload(&mut self, text: String) -> Option<Result<RouterConfig, ConfigError>> {
        if self.last.as_deref() == Some(text.as_str()) {
            return None;
        }
        let parsed = parse_config(&text);
        self.last = Some(text);
        Some(parsed)
    }
}

/// Whether `kind` can change the file's text.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Create(_) => true,
        _ => false,
    }
}

impl ConfigWatcher {
    /// Create a watcher for `path` and the receiver its updates arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let reloader = Arc::new(Mutex::new(Reloader::seeded(&path)));
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Route file watch error");
                        return;
                    }
                };
                if matches!(event.kind, EventKind::Remove(_)) {
                    tracing::warn!(path = ?watched, "Route file removed, keeping current routes");
                    return;
                }
                if !is_content_change(&event.kind) {
                    return;
                }

                let text = match std::fs::read_to_string(&watched) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(path = ?watched, error = %e, "Failed to read route file");
                        return;
                    }
                };
                let Ok(mut reloader) = reloader.lock() else {
                    return;
                };
                match reloader.reload(text) {
                    None => tracing::trace!(path = ?watched, "Route file unchanged"),
                    Some(Ok(config)) => {
                        tracing::info!(path = ?watched, routes = config.routes.len(), "Route file changed, reloading");
                        let _ = update_tx.send(config);
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Failed to reload route file, keeping current routes");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Route file watcher started");
        Ok(watcher)
    }
}
