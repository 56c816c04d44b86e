//! Starter API service library.
//!
//! Bootstraps an HTTP API in generations: each generation resolves its
//! configuration (including OpenID discovery), installs security headers,
//! global validation and the published API documentation, then listens.
//! Under hot reload supervision a new generation replaces the previous one
//! only after the previous one is fully disposed.

// Core subsystems
pub mod app;
pub mod config;
pub mod http;
pub mod net;

// Request handling
pub mod api;
pub mod docs;
pub mod validation;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use app::{AppContext, AppInstance, HandlerGraph};
pub use config::schema::ServiceConfig;
pub use error::BootstrapError;
pub use http::HttpServer;
pub use lifecycle::{BootstrapOrchestrator, LifecycleManager, LifecycleState, ReloadSupervisor};
