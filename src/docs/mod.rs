//! API documentation subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig + handler graph docs
//!     → document.rs (OpenAPI description, rendered once)
//!     → explorer.rs (Swagger UI pages, OAuth client settings)
//!     → publisher.rs (routes under /docs and /docs-json)
//! ```
//!
//! # Design Decisions
//! - Output is a pure function of the config: no clock, no randomness
//! - Artifacts are rebuilt per generation, never patched in place

pub mod document;
pub mod explorer;
pub mod publisher;

pub use document::ApiDocument;
pub use explorer::{ExplorerConfig, OAuthClientConfig};
pub use publisher::{DocumentPublisher, DOCS_PATH, DOCUMENT_PATH, OAUTH2_REDIRECT_PATH};
