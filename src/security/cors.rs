//! CORS policy for browser clients.
//!
//! The service always runs with a permissive cross-origin policy: any origin,
//! the usual API methods, and no credentials. The policy is enabled when the
//! application instance is created and is not configurable.

use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

/// The fixed permissive CORS layer.
///
/// Do not combine the wildcard origin with `allow_credentials(true)`.
pub fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(60 * 10))
}
