// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! API error taxonomy and the structured error body.
//!
//! Every failure the service can produce maps to a JSON error response
//! with an `error_type` discriminant: client faults (malformed body,
//! validation) get a 400, model faults a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Request body could not be parsed into the expected schema.
    InvalidRequest(String),
    /// Request parsed but failed a validation rule.
    ValidationError { field: String, message: String },
    /// Model invocation failed.
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "validation error on {}: {}", field, message)
            }
            ApiError::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_400_with_field_detail() {
        let error = ApiError::ValidationError {
            field: "texts".to_string(),
            message: "too many items".to_string(),
        };

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let body = error.to_response();
        assert_eq!(body.error_type, "validation_error");
        assert_eq!(
            body.details.unwrap().get("field"),
            Some(&serde_json::Value::String("texts".to_string()))
        );
    }

    #[test]
    fn test_internal_error_is_500_without_details() {
        let error = ApiError::InternalError("inference failed".to_string());

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = error.to_response();
        assert_eq!(body.error_type, "internal_error");
        assert!(body.details.is_none());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_invalid_request_is_400() {
        let error = ApiError::InvalidRequest("expected a JSON object".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_response().error_type, "invalid_request");
    }
}
