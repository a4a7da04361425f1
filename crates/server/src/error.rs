//! API error taxonomy
//!
//! Every failure leaves the service as a JSON envelope:
//! `{"error": true, "error_type": ..., "message": ..., "timestamp": ...}`.
//! Client mistakes map to 400, unknown resources to 404, an
//! uninitialized service to 503, and everything else to 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use telemetry_lib::models::now_timestamp;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Telemetry service unavailable")]
    ServiceUnavailable,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::ServiceUnavailable => "service_unavailable",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::MissingField(_) => "missing_field",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!(error = %e, "Request failed");
        }

        let body = json!({
            "error": true,
            "error_type": self.error_type(),
            "message": self.to_string(),
            "timestamp": now_timestamp(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}
