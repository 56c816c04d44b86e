//! Starter API service.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML)
//!       → config (load, validate) → OpenID discovery → ResolvedConfig
//!       → lifecycle::startup: security headers → validation → docs → listen
//!
//!   Client → net::listener → axum Router (security headers outermost)
//!
//!   SIGHUP / file change → reload supervisor: dispose old → listen new
//!   SIGTERM / SIGINT     → lifecycle manager: drain → hooks → exit
//! ```

use std::path::PathBuf;

use clap::Parser;

use starter_api::config::loader::load_config;
use starter_api::config::watcher::ConfigWatcher;
use starter_api::lifecycle::{BootstrapOrchestrator, LifecycleState, ReloadSupervisor};
use starter_api::observability::init_tracing;
use starter_api::{api, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "starter-api", version, about = "Starter API service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/starter-api.toml")]
    config: PathBuf,

    /// Bootstrap a new generation whenever the configuration changes.
    #[arg(short, long)]
    watch: bool,

    /// Log level, overriding `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = load_config(&args.config)?;
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| settings.observability.log_level.clone());
    init_tracing(&level);

    tracing::info!(
        version = %settings.version,
        config = ?args.config,
        watch = args.watch,
        "starter-api v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let mut orchestrator = BootstrapOrchestrator::new(LifecycleState::new(), api::handler_graph());
    let mut server_reloads = None;
    let mut _watcher = None;

    if args.watch {
        orchestrator = orchestrator.with_reload(ReloadSupervisor::new());
        let (watcher, reloads) = ConfigWatcher::new(&args.config);
        _watcher = Some(watcher.run()?);
        server_reloads = Some(reloads);
    }

    let mut server = HttpServer::new(orchestrator, args.config);
    if let Some(reloads) = server_reloads {
        server = server.with_reloads(reloads);
    }

    server.run(settings).await?;
    Ok(())
}
