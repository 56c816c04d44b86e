//! The application instance of one generation.
//!
//! # Responsibilities
//! - Own the handler graph and the installed global middleware while configuring
//! - Compose the final service in a fixed layer order
//! - Track the generation's phase until listening begins
//!
//! # Design Decisions
//! - Each global concern is installed at most once
//! - Layers are composed at the end so the security headers wrap every route,
//!   including the documentation routes added after them

use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::HeaderName;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::OpenApi;

use crate::config::ResolvedConfig;
use crate::docs::DocumentPublisher;
use crate::lifecycle::shutdown::{Shutdown, ShutdownHooks};
use crate::lifecycle::state::{GenerationId, LifecycleState, PhaseTracker};
use crate::net::ConnectionTracker;
use crate::security::{self, SecurityHeaders};
use crate::validation::ValidationPipeline;

/// State handed to every handler of the graph.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<ResolvedConfig>,
    pub validation: Arc<ValidationPipeline>,
}

impl FromRef<AppContext> for Arc<ValidationPipeline> {
    fn from_ref(context: &AppContext) -> Self {
        Arc::clone(&context.validation)
    }
}

impl FromRef<AppContext> for Arc<ResolvedConfig> {
    fn from_ref(context: &AppContext) -> Self {
        Arc::clone(&context.config)
    }
}

/// The business routes plus their API description.
#[derive(Clone)]
pub struct HandlerGraph {
    pub router: Router<AppContext>,
    pub docs: OpenApi,
}

impl HandlerGraph {
    pub fn new(router: Router<AppContext>, docs: OpenApi) -> Self {
        Self { router, docs }
    }
}

/// Why a global install was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("{0} is already installed")]
    AlreadyInstalled(&'static str),
    #[error("{0} requires {1} to be installed first")]
    MissingPrerequisite(&'static str, &'static str),
}

/// The application being configured.
pub struct AppInstance {
    phase: PhaseTracker,
    state: Arc<LifecycleState>,
    handlers: HandlerGraph,
    cors: CorsLayer,
    config: Option<Arc<ResolvedConfig>>,
    security_headers: Option<SecurityHeaders>,
    validation: Option<Arc<ValidationPipeline>>,
    publisher: Option<DocumentPublisher>,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
}

impl AppInstance {
    /// Create the instance for a new generation with permissive CORS enabled.
    pub fn create(state: Arc<LifecycleState>, handlers: HandlerGraph) -> Self {
        let generation = state.next_generation();
        let phase = PhaseTracker::new(generation, Arc::clone(&state));

        Self {
            phase,
            state,
            handlers,
            cors: security::cors::permissive(),
            config: None,
            security_headers: None,
            validation: None,
            publisher: None,
            shutdown: Shutdown::new(),
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn generation(&self) -> GenerationId {
        self.phase.generation()
    }

    pub(crate) fn phase_tracker(&self) -> &PhaseTracker {
        &self.phase
    }

    pub(crate) fn set_config(&mut self, config: ResolvedConfig) {
        self.config = Some(Arc::new(config));
    }

    /// Install the security headers as the outermost response filter.
    pub fn use_security_headers(&mut self, headers: SecurityHeaders) -> Result<(), InstallError> {
        if self.security_headers.is_some() {
            return Err(InstallError::AlreadyInstalled("security headers"));
        }
        self.security_headers = Some(headers);
        Ok(())
    }

    /// Install the global validation pipeline.
    pub fn use_global_validation(&mut self, pipeline: ValidationPipeline) -> Result<(), InstallError> {
        if self.validation.is_some() {
            return Err(InstallError::AlreadyInstalled("validation pipeline"));
        }
        self.validation = Some(Arc::new(pipeline));
        Ok(())
    }

    /// Publish the API description and explorer.
    pub fn publish_docs(&mut self, publisher: DocumentPublisher) -> Result<(), InstallError> {
        if self.publisher.is_some() {
            return Err(InstallError::AlreadyInstalled("document publisher"));
        }
        self.publisher = Some(publisher);
        Ok(())
    }

    pub fn handler_docs(&self) -> &OpenApi {
        &self.handlers.docs
    }

    /// Hand this generation's cleanup hooks to the process-level registry.
    pub(crate) fn install_shutdown_hooks(&self, hooks: &ShutdownHooks) {
        self.state.install_hooks(self.generation(), hooks.clone());
    }

    /// Compose the final service.
    ///
    /// Layer order, outermost first: security headers, CORS, request id,
    /// trace, limits, request tracking, routes.
    pub(crate) fn into_service(self) -> Result<(Router, AppParts), InstallError> {
        let config = self
            .config
            .ok_or(InstallError::MissingPrerequisite("service", "configuration"))?;
        let validation = self
            .validation
            .ok_or(InstallError::MissingPrerequisite("service", "validation pipeline"))?;
        let security_headers = self
            .security_headers
            .ok_or(InstallError::MissingPrerequisite("service", "security headers"))?;

        let context = AppContext {
            config: Arc::clone(&config),
            validation,
        };

        let mut router = self.handlers.router.with_state(context);
        if let Some(publisher) = &self.publisher {
            router = router.merge(publisher.router::<()>());
        }

        let request_id = HeaderName::from_static("x-request-id");
        let router = self.tracker.layer(router);
        let router = security::limits::apply(router, &config.security)
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
            .layer(self.cors);
        let router = security_headers.apply(router);

        Ok((
            router,
            AppParts {
                phase: self.phase,
                state: self.state,
                config,
                shutdown: self.shutdown,
                tracker: self.tracker,
                publisher: self.publisher,
            },
        ))
    }
}

/// What the lifecycle manager takes over from the instance.
pub(crate) struct AppParts {
    pub phase: PhaseTracker,
    pub state: Arc<LifecycleState>,
    pub config: Arc<ResolvedConfig>,
    pub shutdown: Shutdown,
    pub tracker: ConnectionTracker,
    pub publisher: Option<DocumentPublisher>,
}
