//! Configuration provider and per-generation resolution.
//!
//! # Responsibilities
//! - Expose static settings (version, server, auth) through a narrow trait
//! - Fetch the OpenID discovery document over the network
//! - Produce the immutable `ResolvedConfig` a generation is built from
//!
//! # Design Decisions
//! - Resolution happens once per bootstrap; nothing is cached across generations
//! - A discovery failure is fatal, including during a reload
//! - Host/port defaults are applied here, not in the schema

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::{
    AuthConfig, DocsConfig, LifecycleConfig, SecurityConfig, ServerConfig, ServiceConfig,
    DEFAULT_HOST, DEFAULT_PORT,
};

/// Endpoints advertised by an OAuth2/OpenID provider.
///
/// Only the endpoints the service uses are named; everything else in the
/// document is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Source of the service configuration.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// The statically loaded settings.
    fn settings(&self) -> &ServiceConfig;

    /// Fetch the OpenID discovery document. May suspend on network I/O.
    async fn openid_configuration(&self) -> Result<OpenIdConfiguration, ConfigError>;

    fn version(&self) -> String {
        self.settings().version.clone()
    }

    fn auth(&self) -> AuthConfig {
        self.settings().auth.clone()
    }

    fn server(&self) -> ServerConfig {
        self.settings().server.clone()
    }
}

/// Provider backed by a TOML file and an HTTP client for discovery.
pub struct FileConfigProvider {
    settings: ServiceConfig,
    client: reqwest::Client,
}

impl FileConfigProvider {
    /// Wrap already validated settings.
    pub fn new(settings: ServiceConfig) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(settings.lifecycle.discovery_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|source| ConfigError::Discovery {
                url: settings.auth.discovery_endpoint().unwrap_or_default(),
                source,
            })?;

        Ok(Self { settings, client })
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    fn settings(&self) -> &ServiceConfig {
        &self.settings
    }

    async fn openid_configuration(&self) -> Result<OpenIdConfiguration, ConfigError> {
        let url = self
            .settings
            .auth
            .discovery_endpoint()
            .ok_or(ConfigError::MissingDiscovery)?;

        tracing::debug!(url = %url, "Fetching OpenID discovery document");

        let discovery_error = |source: reqwest::Error| {
            if source.is_timeout() {
                ConfigError::DiscoveryTimeout { url: url.clone() }
            } else {
                ConfigError::Discovery {
                    url: url.clone(),
                    source,
                }
            }
        };

        let response = self.client.get(&url).send().await.map_err(discovery_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::DiscoveryStatus {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .json::<OpenIdConfiguration>()
            .await
            .map_err(discovery_error)
    }
}

/// Server settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedServer {
    pub host: String,
    pub port: u16,
    pub domain_url: Url,
}

impl ResolvedServer {
    /// `host:port` as given to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The public base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.domain_url.as_str().trim_end_matches('/')
    }
}

/// Immutable configuration bundle for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub version: String,
    pub server: ResolvedServer,
    pub auth: AuthConfig,
    pub openid: OpenIdConfiguration,
    pub docs: DocsConfig,
    pub security: SecurityConfig,
    pub lifecycle: LifecycleConfig,
}

impl ResolvedConfig {
    /// Resolve static settings and the discovery document from a provider.
    pub async fn resolve(provider: &dyn ConfigProvider) -> Result<Self, ConfigError> {
        let server = provider.server();
        let domain_url =
            Url::parse(&server.domain_url).map_err(|source| ConfigError::DomainUrl {
                value: server.domain_url.clone(),
                source,
            })?;

        let openid = provider.openid_configuration().await?;
        let settings = provider.settings();

        Ok(Self {
            version: provider.version(),
            server: ResolvedServer {
                host: server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: server.port.unwrap_or(DEFAULT_PORT),
                domain_url,
            },
            auth: provider.auth(),
            openid,
            docs: settings.docs.clone(),
            security: settings.security.clone(),
            lifecycle: settings.lifecycle.clone(),
        })
    }
}

#[cfg(test)]
impl ResolvedConfig {
    /// A resolved configuration for unit tests.
    pub(crate) fn fixture(domain_url: &str) -> Self {
        Self {
            version: "1.2.3".into(),
            server: ResolvedServer {
                host: "127.0.0.1".into(),
                port: 0,
                domain_url: Url::parse(domain_url).unwrap(),
            },
            auth: AuthConfig {
                client_id: "starter-docs".into(),
                additional_query_string_params: None,
                issuer: Some("https://id.example.com".into()),
                discovery_url: None,
            },
            openid: OpenIdConfiguration {
                issuer: Some("https://id.example.com".into()),
                authorization_endpoint: "https://id.example.com/auth".into(),
                token_endpoint: "https://id.example.com/token".into(),
                extra: BTreeMap::new(),
            },
            docs: DocsConfig::default(),
            security: SecurityConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}
