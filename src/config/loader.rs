//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("no OpenID discovery source configured")]
    MissingDiscovery,

    #[error("OpenID discovery request to {url} failed: {source}")]
    Discovery {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenID discovery request to {url} timed out")]
    DiscoveryTimeout { url: String },

    #[error("OpenID discovery at {url} returned status {status}")]
    DiscoveryStatus { url: String, status: u16 },

    #[error("invalid server.domain_url '{value}': {source}")]
    DomainUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
