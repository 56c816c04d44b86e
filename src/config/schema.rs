//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default listen host when `server.host` is omitted.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port when `server.port` is omitted.
pub const DEFAULT_PORT: u16 = 3000;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service version advertised in the API description.
    pub version: String,

    /// Network settings.
    pub server: ServerConfig,

    /// OAuth client metadata and discovery source.
    pub auth: AuthConfig,

    /// API documentation settings.
    pub docs: DocsConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Startup/shutdown timing.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
///
/// `host` and `port` are optional; defaults are applied at resolution time.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (e.g., "127.0.0.1").
    pub host: Option<String>,

    /// Bind port.
    pub port: Option<u16>,

    /// Public base URL the service is reachable at (e.g., "https://api.example.com").
    pub domain_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            domain_url: "http://localhost:3000".to_string(),
        }
    }
}

/// OAuth client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client id used by the API explorer.
    pub client_id: String,

    /// Extra query parameters appended to the authorization request.
    pub additional_query_string_params: Option<BTreeMap<String, String>>,

    /// OpenID issuer; discovery is fetched from `{issuer}/.well-known/openid-configuration`.
    pub issuer: Option<String>,

    /// Explicit discovery document URL (overrides `issuer`).
    pub discovery_url: Option<String>,
}

impl AuthConfig {
    /// The URL the OpenID discovery document is fetched from.
    pub fn discovery_endpoint(&self) -> Option<String> {
        if let Some(url) = &self.discovery_url {
            return Some(url.clone());
        }
        self.issuer.as_ref().map(|issuer| {
            format!(
                "{}/.well-known/openid-configuration",
                issuer.trim_end_matches('/')
            )
        })
    }
}

/// API documentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocsConfig {
    /// Document title.
    pub title: String,

    /// Document description.
    pub description: String,

    /// Label of the external documentation link.
    pub external_doc_label: String,

    /// Target of the external documentation link.
    pub external_doc_url: String,

    /// Application name shown on the explorer's OAuth dialog.
    pub app_name: String,

    /// Where the explorer's static assets (swagger-ui-dist) are served from.
    pub asset_base_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            title: "Starter API Docs".to_string(),
            description: "Starter API for the starter kit".to_string(),
            external_doc_label: "Source Repository".to_string(),
            external_doc_url: "https://github.com/starter-kit/starter-api".to_string(),
            app_name: "Starter API".to_string(),
            asset_base_url: "https://unpkg.com/swagger-ui-dist@5".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// `max-age` of the Strict-Transport-Security header.
    pub hsts_max_age_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
            request_timeout_secs: 30,
            hsts_max_age_secs: 15_552_000, // 180 days
        }
    }
}

/// Lifecycle timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Timeout for the OpenID discovery request in seconds.
    pub discovery_timeout_secs: u64,

    /// How long in-flight connections may drain before the server is aborted.
    pub shutdown_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_secs: 10,
            shutdown_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
