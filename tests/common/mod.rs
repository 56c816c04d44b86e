//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use utoipa::openapi::OpenApiBuilder;

use starter_api::app::{AppContext, HandlerGraph};
use starter_api::config::{ConfigError, ConfigProvider, OpenIdConfiguration, ServiceConfig};
use starter_api::lifecycle::LifecycleState;

/// Discovery document served by the mock OpenID provider.
pub fn discovery_document(issuer: &str) -> String {
    serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/protocol/openid-connect/auth"),
        "token_endpoint": format!("{issuer}/protocol/openid-connect/token"),
        "jwks_uri": format!("{issuer}/protocol/openid-connect/certs"),
    })
    .to_string()
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a programmable mock backend answering every request with `(status, body)`.
pub async fn start_programmable_backend<F>(addr: SocketAddr, f: F)
where
    F: Fn() -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f();
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock OpenID provider serving its discovery document.
pub async fn start_openid_provider(addr: SocketAddr) -> String {
    let issuer = format!("http://{addr}/realms/starter");
    let document = discovery_document(&issuer);
    start_programmable_backend(addr, move || (200, document.clone())).await;
    issuer
}

/// Start a backend that accepts connections and never answers.
pub async fn start_stalling_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
}

/// Minimal valid settings listening on `127.0.0.1:port`.
pub fn settings(port: u16, issuer: &str) -> ServiceConfig {
    let mut settings = ServiceConfig::default();
    settings.version = "2.4.1".into();
    settings.server.host = Some("127.0.0.1".into());
    settings.server.port = Some(port);
    settings.server.domain_url = format!("http://127.0.0.1:{port}");
    settings.auth.client_id = "starter-docs".into();
    settings.auth.issuer = Some(issuer.to_string());
    settings.lifecycle.discovery_timeout_secs = 2;
    settings.lifecycle.shutdown_timeout_secs = 5;
    settings
}

/// Provider with a fixed discovery document, no network involved.
pub struct StaticProvider {
    pub settings: ServiceConfig,
    /// Request process termination while discovery is in progress.
    pub terminate: Option<Arc<LifecycleState>>,
}

impl StaticProvider {
    pub fn new(settings: ServiceConfig) -> Self {
        Self {
            settings,
            terminate: None,
        }
    }
}

#[async_trait]
impl ConfigProvider for StaticProvider {
    fn settings(&self) -> &ServiceConfig {
        &self.settings
    }

    async fn openid_configuration(&self) -> Result<OpenIdConfiguration, ConfigError> {
        if let Some(state) = &self.terminate {
            state.request_termination();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(OpenIdConfiguration {
            issuer: Some("https://id.example.com".into()),
            authorization_endpoint: "https://id.example.com/auth".into(),
            token_endpoint: "https://id.example.com/token".into(),
            extra: BTreeMap::new(),
        })
    }
}

/// A handler graph without documented paths.
pub fn undocumented(router: Router<AppContext>) -> HandlerGraph {
    HandlerGraph::new(router, OpenApiBuilder::new().build())
}

/// HTTP client without connection reuse.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
