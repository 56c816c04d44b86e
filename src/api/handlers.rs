use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ResolvedConfig;
use crate::error::ErrorResponse;
use crate::validation::{FieldKind, FieldSpec, RequestShape, Valid};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Feedback left by a user of the starter kit.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub email: String,
    pub message: String,
    /// 1 to 5.
    pub rating: Option<u8>,
}

impl RequestShape for FeedbackRequest {
    const NAME: &'static str = "FeedbackRequest";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("email", FieldKind::String).with_rule("email"),
        FieldSpec::required("message", FieldKind::String).with_rule("non_empty"),
        FieldSpec::optional("rating", FieldKind::Integer).with_rule("positive"),
    ];
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackReceipt {
    pub id: Uuid,
    pub rating: Option<u8>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "starter",
    responses((status = 200, description = "Service is up", body = HealthStatus))
)]
pub async fn health(State(config): State<Arc<ResolvedConfig>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: config.version.clone(),
    })
}

#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "starter",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackReceipt),
        (status = 400, description = "Payload rejected by validation", body = ErrorResponse)
    )
)]
pub async fn submit_feedback(
    Valid(feedback): Valid<FeedbackRequest>,
) -> (StatusCode, Json<FeedbackReceipt>) {
    let id = Uuid::new_v4();
    tracing::info!(feedback_id = %id, rating = ?feedback.rating, "Feedback received");

    (
        StatusCode::CREATED,
        Json(FeedbackReceipt {
            id,
            rating: feedback.rating,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppContext;
    use crate::validation::ValidationPipeline;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/api/feedback", post(submit_feedback))
            .with_state(AppContext {
                config: Arc::new(ResolvedConfig::fixture("http://localhost:3000")),
                validation: Arc::new(ValidationPipeline::default()),
            })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/feedback")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_feedback() {
        let response = app()
            .oneshot(post_json(r#"{"email":"a@b.io","message":"nice","rating":5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn rejects_unknown_property() {
        let response = app()
            .oneshot(post_json(r#"{"email":"a@b.io","message":"nice","admin":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let response = app().oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
