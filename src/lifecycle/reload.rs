//! Hot reload supervision.
//!
//! # Responsibilities
//! - Record which generation accepted hot replacement
//! - Hold the dispose callback the accepted generation registered
//! - Run that callback to completion before a new generation listens
//!
//! # Design Decisions
//! - Dispose is retried once; a second failure aborts the new generation
//! - A failed dispose stays registered so the caller can retry later
//!
//! # Data Flow
//! ```text
//! gen-N bootstrap → accept(gen-N) → dispose(close gen-N)
//! gen-N+1 bootstrap → activate(gen-N+1) → close gen-N → gen-N+1 binds
//! ```

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

use crate::lifecycle::manager::DisposeError;
use crate::lifecycle::state::GenerationId;

/// Callback disposing the accepted generation.
pub type DisposeFn = Box<dyn FnMut() -> BoxFuture<'static, Result<(), DisposeError>> + Send>;

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("dispose of {previous} failed before {next} could listen: {source}")]
    DisposeFailed {
        previous: GenerationId,
        next: GenerationId,
        #[source]
        source: DisposeError,
    },
}

#[derive(Default)]
struct Registration {
    accepted: Option<GenerationId>,
    dispose: Option<DisposeFn>,
}

/// Coordinates hot replacement between successive generations.
#[derive(Default)]
pub struct ReloadSupervisor {
    registration: Mutex<Registration>,
}

impl ReloadSupervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Declare that `generation` accepts being replaced.
    pub async fn accept(&self, generation: GenerationId) {
        let mut registration = self.registration.lock().await;
        registration.accepted = Some(generation);
        tracing::debug!(generation = %generation, "Hot replacement accepted");
    }

    /// Register the callback that disposes the accepted generation.
    pub async fn dispose(&self, callback: DisposeFn) {
        self.registration.lock().await.dispose = Some(callback);
    }

    /// The generation that accepted replacement, if any.
    pub async fn accepted(&self) -> Option<GenerationId> {
        self.registration.lock().await.accepted
    }

    /// Announce that `next` replaces the accepted generation.
    ///
    /// Returns once the previous generation is fully disposed.
    pub async fn activate(&self, next: GenerationId) -> Result<(), ReloadError> {
        let mut registration = self.registration.lock().await;
        let Some(mut dispose) = registration.dispose.take() else {
            return Ok(());
        };
        let previous = registration.accepted.take().unwrap_or(next);

        tracing::info!(previous = %previous, next = %next, "Disposing previous generation");

        let first = match dispose().await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        tracing::warn!(previous = %previous, error = %first, "Dispose failed, retrying once");

        match dispose().await {
            Ok(()) => Ok(()),
            Err(source) => {
                tracing::error!(previous = %previous, error = %source, "Dispose failed twice");
                registration.accepted = Some(previous);
                registration.dispose = Some(dispose);
                Err(ReloadError::DisposeFailed {
                    previous,
                    next,
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for ReloadSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadSupervisor").finish_non_exhaustive()
    }
}
