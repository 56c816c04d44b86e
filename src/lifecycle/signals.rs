//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//! - Trigger appropriate actions (shutdown, reload)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - One handler task per process, shared by every generation
//! - A second SIGTERM/SIGINT while draining forces exit
//! - SIGHUP triggers a reload, not shutdown

use std::sync::Arc;

use crate::lifecycle::state::LifecycleState;

/// Resolve on the first SIGINT or SIGTERM.
pub async fn termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Resolve on SIGHUP. Never resolves on platforms without it.
pub async fn reload() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::hangup()) {
            Ok(mut stream) => {
                stream.recv().await;
                return;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGHUP handler"),
        }
    }

    std::future::pending::<()>().await
}

/// Make termination signals reach every generation through `state`.
///
/// The first signal latches the process termination request; a second one
/// exits the process. Installing twice is a no-op.
pub fn enable_shutdown_hooks(state: &Arc<LifecycleState>) {
    if !state.enable_signals() {
        return;
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::select! {
            _ = termination() => {
                tracing::info!("Shutdown signal received");
                state.request_termination();
            }
            // Termination requested programmatically.
            _ = state.termination().wait() => {}
        }

        termination().await;
        tracing::error!("Second shutdown signal, forcing exit");
        std::process::exit(130);
    });

    tracing::debug!("Signal handlers installed");
}
