//! HTTP server process loop.
//!
//! # Responsibilities
//! - Bootstrap the first generation from the loaded settings
//! - Bootstrap a replacement generation on every reload trigger
//! - Close the current generation on termination
//!
//! # Design Decisions
//! - Reload triggers are only honored under reload supervision
//! - A failed reload is fatal; the running generation is closed first
//! - Bursts of file events collapse to the latest revision

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::loader::load_config;
use crate::config::{FileConfigProvider, ServiceConfig};
use crate::error::BootstrapError;
use crate::lifecycle::signals;
use crate::lifecycle::{BootstrapOrchestrator, LifecycleManager};

/// The service process: one generation at a time.
pub struct HttpServer {
    orchestrator: BootstrapOrchestrator,
    config_path: PathBuf,
    reloads: Option<UnboundedReceiver<ServiceConfig>>,
}

impl HttpServer {
    pub fn new(orchestrator: BootstrapOrchestrator, config_path: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            config_path: config_path.into(),
            reloads: None,
        }
    }

    /// Bootstrap a new generation for every settings revision received.
    pub fn with_reloads(mut self, reloads: UnboundedReceiver<ServiceConfig>) -> Self {
        self.reloads = Some(reloads);
        self
    }

    /// Run until the process is asked to terminate.
    pub async fn run(mut self, settings: ServiceConfig) -> Result<(), BootstrapError> {
        let provider = FileConfigProvider::new(settings)?;
        let mut current = self.orchestrator.bootstrap(&provider).await?;
        let supervised = self.orchestrator.reload_supervisor().is_some();

        loop {
            let next = tokio::select! {
                _ = current.wait_for_shutdown() => None,
                settings = self.next_reload(), if supervised => Some(settings),
            };

            let Some(settings) = next else {
                break;
            };

            tracing::info!(previous = %current.generation(), "Reloading");
            match self.replace(settings).await {
                Ok(next) => current = next,
                Err(e) => {
                    tracing::error!(error = %e, "Reload failed, shutting down");
                    close(&current).await;
                    return Err(e);
                }
            }
        }

        tracing::info!(generation = %current.generation(), "Shutdown requested");
        current.close().await?;
        tracing::info!("Shutdown complete");
        Ok(())
    }

    async fn replace(&self, settings: ServiceConfig) -> Result<Arc<LifecycleManager>, BootstrapError> {
        let provider = FileConfigProvider::new(settings)?;
        self.orchestrator.bootstrap(&provider).await
    }

    /// Next settings revision from the watcher or SIGHUP.
    async fn next_reload(&mut self) -> ServiceConfig {
        loop {
            tokio::select! {
                settings = watched(&mut self.reloads) => return settings,
                _ = signals::reload() => match load_config(&self.config_path) {
                    Ok(settings) => {
                        tracing::info!(path = ?self.config_path, "SIGHUP received");
                        return settings;
                    }
                    Err(e) => tracing::warn!(error = %e, "SIGHUP ignored, config is invalid"),
                },
            }
        }
    }
}

async fn watched(reloads: &mut Option<UnboundedReceiver<ServiceConfig>>) -> ServiceConfig {
    if let Some(rx) = reloads.as_mut() {
        if let Some(mut settings) = rx.recv().await {
            while let Ok(newer) = rx.try_recv() {
                settings = newer;
            }
            return settings;
        }
        tracing::warn!("Config watcher stopped");
        *reloads = None;
    }
    std::future::pending().await
}

async fn close(manager: &LifecycleManager) {
    if let Err(e) = manager.close().await {
        tracing::error!(generation = %manager.generation(), error = %e, "Dispose failed");
    }
}
