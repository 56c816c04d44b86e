//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → provider.rs (ConfigProvider + OpenID discovery)
//!     → ResolvedConfig (one per generation)
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → a new generation is bootstrapped from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a new generation
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod provider;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use provider::{ConfigProvider, FileConfigProvider, OpenIdConfiguration, ResolvedConfig};
pub use schema::{AuthConfig, ServerConfig, ServiceConfig};
