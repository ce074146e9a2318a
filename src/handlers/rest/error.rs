//! Mapping of service errors onto HTTP responses.
//!
//! Storage and internal failures are sanitized; full details are logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ServiceError;

/// Provider outage, safe to retry.
pub const PROVIDER_UNAVAILABLE: &str = "Proxy provider temporarily unavailable, try again";

/// Storage or invariant failure.
pub const INTERNAL_ERROR: &str = "Internal service error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: String,
}

impl ServiceError {
    /// HTTP status and stable error code.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::InsufficientFunds { .. } => {
                (StatusCode::PAYMENT_REQUIRED, "insufficient_funds")
            }
            ServiceError::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable")
            }
            ServiceError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::AlreadyProcessed(_) => (StatusCode::OK, "already_processed"),
            ServiceError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ServiceError::Storage(_) | ServiceError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let details = match &self {
            ServiceError::ProviderUnavailable(reason) => {
                debug!(reason = %reason, "Provider unavailable");
                PROVIDER_UNAVAILABLE.to_string()
            }
            ServiceError::Storage(_) | ServiceError::Internal(_) => {
                error!(error = %self, "Request failed");
                INTERNAL_ERROR.to_string()
            }
            other => other.to_string(),
        };

        if status == StatusCode::OK {
            return (
                status,
                Json(serde_json::json!({ "status": code, "details": details })),
            )
                .into_response();
        }
        (status, Json(ErrorBody { error: code, details })).into_response()
    }
}
