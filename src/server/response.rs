use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result as StoreResult;
use crate::knowledge::JsonlRejection;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to the standard failure envelope: a null `data`
/// field, a human-readable `error`, and a machine-readable `code`. Extra
/// top-level fields (like JSONL rejection positions) ride along in
/// `details`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    details: Option<serde_json::Map<String, Value>>,
}

impl ApiError {
    #[must_use]
    pub fn with_code(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "not_found", message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    #[must_use]
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "config_missing", message)
    }

    /// Maps a strict-validation rejection onto the upload contract: 400
    /// with the offending line number and a snippet of it.
    #[must_use]
    pub fn invalid_jsonl(rejection: &JsonlRejection) -> Self {
        let message = rejection
            .errors
            .first()
            .cloned()
            .unwrap_or_else(|| "Invalid JSONL file".to_string());

        let mut details = serde_json::Map::new();
        details.insert("lineNumber".to_string(), rejection.line_number.into());
        details.insert(
            "snippet".to_string(),
            Value::String(rejection.snippet.clone()),
        );
        details.insert("errors".to_string(), rejection.errors.clone().into());

        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_jsonl",
            message,
            details: Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert("data".to_string(), Value::Null);
        body.insert("error".to_string(), Value::String(self.message));
        body.insert("code".to_string(), Value::String(self.code.to_string()));
        if let Some(details) = self.details {
            body.extend(details);
        }
        (self.status, Json(Value::Object(body))).into_response()
    }
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::internal(message))
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}
