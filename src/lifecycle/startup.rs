//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the application instance of a new generation
//! - Resolve configuration, including OpenID discovery
//! - Install security headers, validation and the API documentation
//! - Hand the previous generation over to its dispose before listening
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is rolled back
//! - Steps run in order, never concurrently
//! - Listening starts last (traffic only when ready)

use std::sync::Arc;

use futures_util::FutureExt;

use crate::app::{AppInstance, HandlerGraph};
use crate::config::{ConfigProvider, ResolvedConfig};
use crate::docs::DocumentPublisher;
use crate::error::BootstrapError;
use crate::lifecycle::manager::LifecycleManager;
use crate::lifecycle::reload::ReloadSupervisor;
use crate::lifecycle::shutdown::ShutdownHooks;
use crate::lifecycle::signals;
use crate::lifecycle::state::{LifecycleState, Phase};
use crate::security::SecurityHeaders;
use crate::validation::{ValidationPipeline, ValidationPolicy, ValidatorRegistry};

/// Builds and starts one generation per `bootstrap` call.
pub struct BootstrapOrchestrator {
    state: Arc<LifecycleState>,
    handlers: HandlerGraph,
    validators: ValidatorRegistry,
    hooks: ShutdownHooks,
    reload: Option<Arc<ReloadSupervisor>>,
    os_signals: bool,
}

impl BootstrapOrchestrator {
    pub fn new(state: Arc<LifecycleState>, handlers: HandlerGraph) -> Self {
        Self {
            state,
            handlers,
            validators: ValidatorRegistry::new(),
            hooks: ShutdownHooks::new(),
            reload: None,
            os_signals: true,
        }
    }

    /// Use `validators` for custom rule lookups.
    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }

    /// Run under hot reload supervision.
    pub fn with_reload(mut self, supervisor: Arc<ReloadSupervisor>) -> Self {
        self.reload = Some(supervisor);
        self
    }

    /// Leave SIGINT/SIGTERM alone; termination is then only requested through
    /// [`LifecycleState::request_termination`].
    pub fn without_os_signals(mut self) -> Self {
        self.os_signals = false;
        self
    }

    /// Register a cleanup hook installed on every generation.
    pub fn on_shutdown<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.add(name, hook);
        self
    }

    pub fn reload_supervisor(&self) -> Option<&Arc<ReloadSupervisor>> {
        self.reload.as_ref()
    }

    /// Bootstrap a new generation and return it once it is listening.
    pub async fn bootstrap(
        &self,
        provider: &dyn ConfigProvider,
    ) -> Result<Arc<LifecycleManager>, BootstrapError> {
        let mut app = AppInstance::create(Arc::clone(&self.state), self.handlers.clone());
        let generation = app.generation();
        tracing::info!(generation = %generation, step = "create", "Application instance created");

        app.phase_tracker().advance(Phase::Configuring)?;

        let config = ResolvedConfig::resolve(provider).await.map_err(|e| {
            tracing::error!(generation = %generation, step = "config", error = %e, "Configuration resolution failed");
            e
        })?;
        tracing::info!(
            generation = %generation,
            step = "config",
            version = %config.version,
            domain_url = %config.server.base_url(),
            "Configuration resolved"
        );

        let headers = SecurityHeaders::from_config(&config);
        tracing::debug!(generation = %generation, step = "security", headers = headers.names().count(), "Security headers installed");
        app.use_security_headers(headers)?;

        app.use_global_validation(ValidationPipeline::new(
            ValidationPolicy::STRICT,
            self.validators.clone(),
        ))?;
        tracing::debug!(generation = %generation, step = "validation", "Global validation installed");

        let publisher = DocumentPublisher::build(&config, app.handler_docs().clone())?;
        tracing::info!(
            generation = %generation,
            step = "docs",
            version = %publisher.document().version(),
            "API documentation published"
        );
        app.publish_docs(publisher)?;
        app.set_config(config);

        if self.os_signals {
            signals::enable_shutdown_hooks(&self.state);
        }
        app.install_shutdown_hooks(&self.hooks);

        if let Some(reload) = &self.reload {
            if let Err(e) = reload.activate(generation).await {
                self.state.take_hooks(generation);
                return Err(e.into());
            }
        }

        let (router, parts) = app.into_service()?;
        let manager = LifecycleManager::listen(router, parts).await?;

        if let Some(reload) = &self.reload {
            reload.accept(generation).await;
            let disposing = Arc::clone(&manager);
            reload
                .dispose(Box::new(move || {
                    let manager = Arc::clone(&disposing);
                    async move { manager.close().await }.boxed()
                }))
                .await;
        }

        Ok(manager)
    }
}

impl std::fmt::Debug for BootstrapOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapOrchestrator")
            .field("hooks", &self.hooks)
            .field("reload", &self.reload.is_some())
            .finish_non_exhaustive()
    }
}
