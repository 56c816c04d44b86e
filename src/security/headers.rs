//! Security response headers.
//!
//! # Responsibilities
//! - Clickjacking protection
//! - MIME sniffing protection
//! - Referrer leakage control
//! - Cross-origin isolation and transport hardening
//!
//! # Design Decisions
//! - Default deny: the header set is fixed and applied to every response
//! - Headers override anything a handler set
//! - The content security policy only widens for the explorer's asset host
//!   and the OAuth token endpoint, both known at bootstrap

use axum::http::header::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use url::Url;

use crate::config::ResolvedConfig;

/// The fixed set of security headers for one generation.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    /// Build the header set from the resolved configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let csp = content_security_policy(
            origin_of(&config.docs.asset_base_url).as_deref(),
            origin_of(&config.openid.token_endpoint).as_deref(),
        );
        let hsts = format!(
            "max-age={}; includeSubDomains",
            config.security.hsts_max_age_secs
        );

        let mut headers = vec![(
            HeaderName::from_static("content-security-policy"),
            header_value(&csp),
        )];
        headers.extend(
            [
                ("cross-origin-opener-policy", "same-origin"),
                ("cross-origin-resource-policy", "same-origin"),
                ("origin-agent-cluster", "?1"),
                ("referrer-policy", "no-referrer"),
                ("x-content-type-options", "nosniff"),
                ("x-dns-prefetch-control", "off"),
                ("x-download-options", "noopen"),
                ("x-frame-options", "SAMEORIGIN"),
                ("x-permitted-cross-domain-policies", "none"),
                ("x-xss-protection", "0"),
            ]
            .into_iter()
            .map(|(name, value)| {
                (
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            }),
        );
        headers.push((
            HeaderName::from_static("strict-transport-security"),
            header_value(&hsts),
        ));

        Self { headers }
    }

    /// Header names in the set.
    pub fn names(&self) -> impl Iterator<Item = &HeaderName> {
        self.headers.iter().map(|(name, _)| name)
    }

    /// Apply the header set to every route currently on `router`.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.headers
            .iter()
            .fold(router, |router, (name, value)| {
                router.layer(SetResponseHeaderLayer::overriding(
                    name.clone(),
                    value.clone(),
                ))
            })
    }
}

fn content_security_policy(asset_origin: Option<&str>, token_origin: Option<&str>) -> String {
    let with_origin = |base: &str, origin: Option<&str>| match origin {
        Some(origin) => format!("{base} {origin}"),
        None => base.to_string(),
    };

    [
        "default-src 'self'".to_string(),
        "base-uri 'self'".to_string(),
        "font-src 'self' https: data:".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'self'".to_string(),
        "img-src 'self' data:".to_string(),
        "object-src 'none'".to_string(),
        with_origin("script-src 'self'", asset_origin),
        "script-src-attr 'none'".to_string(),
        "style-src 'self' https: 'unsafe-inline'".to_string(),
        with_origin("connect-src 'self'", token_origin),
        "upgrade-insecure-requests".to_string(),
    ]
    .join(";")
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|url| url.origin())
        .filter(|origin| origin.is_tuple())
        .map(|origin| origin.ascii_serialization())
}

// Only built from validated config; fall back to the most restrictive value.
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("default-src 'none'"))
}
