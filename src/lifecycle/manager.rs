//! The listening generation.
//!
//! # Responsibilities
//! - Claim the listen socket and serve the composed application
//! - Observe termination requests, including ones queued during bootstrap
//! - Dispose: stop accepting, drain, run cleanup hooks, release the socket
//!
//! # Design Decisions
//! - The drain is bounded by `lifecycle.shutdown_timeout_secs`; the server task is aborted after it
//! - A failed dispose leaves the generation in `Disposing` so it can be retried
//! - `close` is idempotent once `Closed`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::app::AppParts;
use crate::config::ResolvedConfig;
use crate::docs::DocumentPublisher;
use crate::error::BootstrapError;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{GenerationId, LifecycleError, LifecycleState, Phase, PhaseTracker};
use crate::net::{self, ConnectionTracker};

#[derive(Debug, thiserror::Error)]
pub enum DisposeError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("{generation}: shutdown hooks failed: {}", .errors.join("; "))]
    Hooks {
        generation: GenerationId,
        errors: Vec<String>,
    },
}

/// A generation that reached `Listening`.
pub struct LifecycleManager {
    phase: PhaseTracker,
    state: Arc<LifecycleState>,
    config: Arc<ResolvedConfig>,
    address: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    publisher: Option<DocumentPublisher>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl LifecycleManager {
    /// Bind the configured address and start serving `router`.
    pub(crate) async fn listen(router: Router, parts: AppParts) -> Result<Arc<Self>, BootstrapError> {
        let AppParts {
            phase,
            state,
            config,
            shutdown,
            tracker,
            publisher,
        } = parts;
        let generation = phase.generation();

        if let Err(e) = state.claim_listener(generation) {
            state.take_hooks(generation);
            return Err(BootstrapError::Bind {
                address: config.server.bind_address(),
                source: std::io::Error::new(std::io::ErrorKind::AddrInUse, e),
            });
        }

        let bound = net::listener::bind(&config.server.host, config.server.port).await;
        let (listener, address) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                state.release_listener(generation);
                state.take_hooks(generation);
                return Err(e);
            }
        };

        if let Err(e) = phase.advance(Phase::Listening) {
            state.release_listener(generation);
            state.take_hooks(generation);
            return Err(e.into());
        }

        let stop = shutdown.clone();
        let termination = state.termination().clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        _ = stop.wait() => {}
                        _ = termination.wait() => {}
                    }
                })
                .await
        });

        tracing::info!(
            generation = %generation,
            address = %address,
            "Application listening on {}",
            config.server.base_url()
        );

        let manager = Arc::new(Self {
            phase,
            state,
            config,
            address,
            shutdown,
            tracker,
            publisher,
            server: Mutex::new(Some(server)),
        });

        if manager.shutdown_requested() {
            tracing::info!(generation = %generation, "Shutdown was requested during bootstrap");
        }

        Ok(manager)
    }

    pub fn generation(&self) -> GenerationId {
        self.phase.generation()
    }

    pub fn phase(&self) -> Phase {
        self.phase.current()
    }

    /// Address the listen socket is bound to.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    pub fn publisher(&self) -> Option<&DocumentPublisher> {
        self.publisher.as_ref()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Whether this generation or the whole process was asked to stop.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_triggered() || self.state.termination().is_triggered()
    }

    /// Resolve once a shutdown of this generation or the process is requested.
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = self.shutdown.wait() => {}
            _ = self.state.termination().wait() => {}
        }
    }

    /// Dispose this generation.
    ///
    /// Stops accepting, drains in-flight requests, releases the listen
    /// socket and runs the cleanup hooks. Calling it again after a failure
    /// retries the failed hooks.
    pub async fn close(&self) -> Result<(), DisposeError> {
        let generation = self.generation();
        let mut server = self.server.lock().await;

        match self.phase.current() {
            Phase::Listening => self.phase.advance(Phase::Disposing)?,
            Phase::Disposing => tracing::info!(generation = %generation, "Retrying dispose"),
            Phase::Closed => return Ok(()),
            from => {
                return Err(LifecycleError::InvalidTransition {
                    generation,
                    from,
                    to: Phase::Disposing,
                }
                .into())
            }
        }

        self.shutdown.trigger();

        if let Some(mut handle) = server.take() {
            let deadline = Duration::from_secs(self.config.lifecycle.shutdown_timeout_secs);
            match tokio::time::timeout(deadline, &mut handle).await {
                Ok(Ok(Ok(()))) => tracing::debug!(
                    generation = %generation,
                    served = self.tracker.served_count(),
                    "Server drained"
                ),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(generation = %generation, error = %e, "Server stopped with error")
                }
                Ok(Err(e)) => {
                    tracing::warn!(generation = %generation, error = %e, "Server task failed")
                }
                Err(_) => {
                    tracing::warn!(
                        generation = %generation,
                        in_flight = self.tracker.active_count(),
                        "Drain timed out, aborting server"
                    );
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }

        self.state.release_listener(generation);

        if let Some(mut hooks) = self.state.take_hooks(generation) {
            let errors = hooks.run().await;
            if !errors.is_empty() {
                self.state.install_hooks(generation, hooks);
                return Err(DisposeError::Hooks { generation, errors });
            }
        }

        self.phase.advance(Phase::Closed)?;
        Ok(())
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("generation", &self.generation())
            .field("phase", &self.phase())
            .field("address", &self.address)
            .finish()
    }
}
