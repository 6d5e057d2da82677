use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::core::{BackendError, ReelError, ValidationError};

use super::types::ErrorResponse;

/// Wraps service errors with an HTTP status code mapping.
#[derive(Debug)]
pub struct ApiError(pub ReelError);

impl From<ReelError> for ApiError {
    fn from(err: ReelError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            ReelError::Validation(ValidationError::UnknownBackend(_)) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_BACKEND")
            }
            ReelError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ReelError::Backend(BackendError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT")
            }
            ReelError::Backend(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            ReelError::Normalization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NORMALIZATION_ERROR")
            }
            ReelError::ConfigParsingError(_) | ReelError::IoError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
