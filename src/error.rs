//! Error types shared across subsystems.
//!
//! - `ApiError`: per-request failures, rendered as JSON responses
//! - `BootstrapError`: fatal startup failures of one generation

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::app::InstallError;
use crate::config::ConfigError;
use crate::lifecycle::manager::DisposeError;
use crate::lifecycle::reload::ReloadError;
use crate::lifecycle::state::LifecycleError;
use crate::validation::ValidationRejection;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// A request-level failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed for {target}: {}", .details.join("; "))]
    Validation {
        target: &'static str,
        details: Vec<String>,
    },
    /// The body could not be read as JSON. `status` is the extractor's own
    /// (400, 413, 415, 422).
    #[error("malformed {target} payload ({status}): {message}")]
    Malformed {
        target: &'static str,
        status: StatusCode,
        message: String,
    },
}

impl ApiError {
    pub fn malformed(target: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Malformed {
            target,
            status,
            message: message.into(),
        }
    }
}

impl From<ValidationRejection> for ApiError {
    fn from(rejection: ValidationRejection) -> Self {
        Self::Validation {
            target: rejection.target,
            details: rejection.details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Validation { target, details } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                format!("{target} payload failed validation"),
                details,
            ),
            ApiError::Malformed {
                target,
                status,
                message,
            } => (
                status,
                "MALFORMED_PAYLOAD",
                format!("{target} payload could not be read as JSON"),
                vec![message],
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// A fatal failure while bootstrapping a generation.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("configuration could not be resolved: {0}")]
    ConfigResolution(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("global middleware could not be installed: {0}")]
    Install(#[from] InstallError),

    #[error("API document could not be rendered: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Dispose(#[from] DisposeError),

    #[error(transparent)]
    Reload(#[from] ReloadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validation_error_renders_details() {
        let response = ApiError::from(ValidationRejection {
            target: "Feedback",
            details: vec!["property admin should not exist".into()],
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["details"][0], "property admin should not exist");
    }

    #[tokio::test]
    async fn malformed_keeps_extractor_status() {
        let response = ApiError::malformed(
            "Feedback",
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected request with `Content-Type: application/json`",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "MALFORMED_PAYLOAD");
    }
}
