//! Request limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Bound total request time
//!
//! # Design Decisions
//! - Limits come from the generation's config, never from the request
//! - Oversized bodies return 413 Payload Too Large, slow requests 408

use std::time::Duration;

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::schema::SecurityConfig;

/// Apply body size and timeout limits to every route on `router`.
#[allow(deprecated)]
pub fn apply<S>(router: Router<S>, config: &SecurityConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
}
