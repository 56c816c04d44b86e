//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - The parent directory is watched and events are filtered by file name,
//!   so saves that rename a new file over the old one keep being seen
//! - Changes are debounced: a burst of writes yields one load of the latest
//!   contents

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Quiet period after the last change before the file is read.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// A watcher that monitors the configuration file for changes.
///
/// Every successfully loaded and validated revision is sent to the receiver;
/// the receiver side decides when to start a new generation.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called inside a tokio runtime; the returned
    /// watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self.path.file_name().map(OsString::from).ok_or_else(|| {
            notify::Error::generic("config path has no file name")
                .add_path(self.path.clone())
        })?;
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (change_tx, change_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if touches(&event, &file_name) {
                        let _ = change_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tokio::spawn(debounce_loads(self.path.clone(), change_rx, self.update_tx));

        tracing::info!(path = ?self.path, directory = ?directory, "Config watcher started");
        Ok(watcher)
    }
}

/// Whether `event` writes, creates, or renames onto the watched file.
fn touches(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

async fn debounce_loads(
    path: PathBuf,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<ServiceConfig>,
) {
    while changes.recv().await.is_some() {
        // Absorb the rest of the burst.
        loop {
            match tokio::time::timeout(DEBOUNCE, changes.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        tracing::info!(path = ?path, "Config file change detected");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current generation");
            }
        }
    }
}
