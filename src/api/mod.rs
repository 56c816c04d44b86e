//! Built-in handler graph.
//!
//! # Responsibilities
//! - Route the service's own endpoints under `/api`
//! - Describe them for the published API document

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

use crate::app::{AppContext, HandlerGraph};
use crate::error::ErrorResponse;
use self::handlers::*;

#[derive(OpenApi)]
#[openapi(
    paths(health, submit_feedback),
    components(schemas(HealthStatus, FeedbackRequest, FeedbackReceipt, ErrorResponse)),
    tags((name = "starter", description = "Starter API endpoints"))
)]
pub struct StarterApiDoc;

/// The routes served by the `starter-api` binary.
pub fn handler_graph() -> HandlerGraph {
    let router: Router<AppContext> = Router::new()
        .route("/api/health", get(health))
        .route("/api/feedback", post(submit_feedback));

    HandlerGraph::new(router, StarterApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_documents_its_routes() {
        let graph = handler_graph();
        let paths: Vec<_> = graph.docs.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/api/health".to_string()));
        assert!(paths.contains(&"/api/feedback".to_string()));
    }
}
