//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::document::DocumentError;
use crate::patch::PatchError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be used
    InvalidRequest(String),

    /// Document parsed but broke one or more rules
    InvalidDocument(Vec<String>),

    /// Resource not found
    NotFound(String),

    /// Internal server error
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidDocument(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "document failed validation",
                    "errors": errors,
                }),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation(errors) => ApiError::InvalidDocument(errors),
            DocumentError::Encoding(_) | DocumentError::Patch(PatchError::Encoding(_)) => {
                ApiError::Internal(err.to_string())
            }
            other => ApiError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
