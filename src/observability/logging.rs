//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Derive the default filter from the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via config, CLI and environment

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("starter_api={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
