//! Response types for the PMMIS API.
//!
//! This module defines the error response structures, the mapping from
//! [`AppError`] to HTTP statuses, and the helpers handlers use to turn
//! results into responses.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErrorResponse {
    fn from(error: AppError) -> Self {
        let message = error.to_string();
        match error {
            AppError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            AppError::ConfigParseError { .. } | AppError::ConfigInvalid { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
            AppError::NotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("NOT_FOUND", message),
            },
            AppError::Validation { field, .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "VALIDATION_ERROR",
                    message,
                    format!("Check the value of '{}'", field),
                ),
            },
            AppError::Conflict { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("CONFLICT", message),
            },
            AppError::Unauthorized { .. } => ApiErrorResponse {
                status: StatusCode::UNAUTHORIZED,
                error: ApiError::with_details(
                    "UNAUTHORIZED",
                    message,
                    "Send the acting user's id in the X-User-Id header",
                ),
            },
            AppError::Forbidden { .. } => ApiErrorResponse {
                status: StatusCode::FORBIDDEN,
                error: ApiError::new("FORBIDDEN", message),
            },
            AppError::InvalidTransition { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("INVALID_TRANSITION", message),
            },
            AppError::Database { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("DATABASE_ERROR", "Database error", message),
            },
        }
    }
}

/// Maps a JSON body rejection to an error response.
pub fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> ApiErrorResponse {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // Get the body text which contains the detailed error from serde
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error,
    }
}

/// Turns a handler result into a JSON response, logging the outcome.
pub fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &str,
    status: StatusCode,
    result: AppResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                status = status.as_u16(),
                "Request completed"
            );
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(body),
            )
                .into_response()
        }
        Err(err) => failure(correlation_id, operation, err),
    }
}

/// Turns a failed handler result into an error response, logging it.
pub fn failure(correlation_id: Uuid, operation: &str, err: AppError) -> Response {
    let response: ApiErrorResponse = err.into();
    warn!(
        correlation_id = %correlation_id,
        operation,
        status = response.status.as_u16(),
        error = %response.error.message,
        "Request failed"
    );
    response.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details")); // Should be skipped when None
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api_error: ApiErrorResponse = AppError::not_found("contract", 9).into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.error.code, "NOT_FOUND");
        assert_eq!(api_error.error.message, "contract 9 not found");
    }

    #[test]
    fn test_workflow_and_access_errors_map_to_their_statuses() {
        let cases = [
            (
                AppError::InvalidTransition {
                    action: "submit".to_string(),
                    status: "rejected".to_string(),
                },
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
            ),
            (
                AppError::Forbidden {
                    username: "u".to_string(),
                    action: "edit".to_string(),
                    resource: "contracts".to_string(),
                },
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                AppError::Unauthorized {
                    message: "missing".to_string(),
                },
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::validation("payment", "amount", "must be positive"),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (
                AppError::Conflict {
                    message: "duplicate".to_string(),
                },
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
        ];
        for (error, status, code) in cases {
            let api_error: ApiErrorResponse = error.into();
            assert_eq!(api_error.status, status);
            assert_eq!(api_error.error.code, code);
        }
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let api_error: ApiErrorResponse = AppError::Database {
            message: "disk I/O error".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.error.code, "DATABASE_ERROR");
        assert!(api_error.error.details.unwrap().contains("disk I/O error"));
    }
}
