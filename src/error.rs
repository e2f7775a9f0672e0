//! Domain error types for the academy server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::collections::BTreeMap;
use std::fmt;

use actix_web::{HttpResponse, ResponseError};

use crate::services::video_host::VideoHostError;

/// Per-field validation messages, keyed by request field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// One or more request fields failed validation
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Video host lookup failed
    #[error("Video host error: {0}")]
    VideoHost(#[from] VideoHostError),

    /// Storage (S3) operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Third-party service (OAuth, copywriter) failed
    #[error("External service error: {0}")]
    External(String),
}

impl AppError {
    /// Validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::VideoHost(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let mut errors = None;
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", self.to_string())
            }
            AppError::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::Validation(fields) => {
                errors = Some(fields.clone());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_FAILED",
                    "The given data was invalid".to_string(),
                )
            }
            AppError::VideoHost(err) => {
                tracing::warn!("Video host error: {:?}", err);
                let message = err.user_message().to_string();
                let mut fields = FieldErrors::new();
                fields.insert("asset_id".to_string(), vec![message.clone()]);
                errors = Some(fields);
                (StatusCode::UNPROCESSABLE_ENTITY, "VIDEO_HOST_ERROR", message)
            }
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                self.to_string(),
            ),
            AppError::External(err_str) => {
                tracing::warn!("External service error: {}", err_str);
                (
                    StatusCode::BAD_GATEWAY,
                    "EXTERNAL_SERVICE_ERROR",
                    "An upstream service failed, please try again".to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
            errors,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Field name → messages, present on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in err.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid", field))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "The title field is required"))]
        title: String,
        #[validate(url)]
        website: String,
    }

    fn body_json(err: &AppError) -> serde_json::Value {
        let bytes = err.error_response().into_body().try_into_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_errors_are_keyed_by_field() {
        let sample = Sample {
            title: String::new(),
            website: "not a url".to_string(),
        };
        let err: AppError = sample.validate().unwrap_err().into();

        assert_eq!(err.error_response().status().as_u16(), 422);
        let body = body_json(&err);
        assert_eq!(body["error"], "VALIDATION_FAILED");
        assert_eq!(body["errors"]["title"][0], "The title field is required");
        assert_eq!(body["errors"]["website"][0], "The website field is invalid");
    }

    #[test]
    fn test_database_error_message_is_hidden() {
        let err = AppError::Database("relation \"courses\" does not exist".to_string());
        let body = body_json(&err);
        assert_eq!(err.error_response().status().as_u16(), 500);
        assert_eq!(body["message"], "An internal database error occurred");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_video_host_error_maps_to_asset_field() {
        let err = AppError::from(VideoHostError::NoCaptions);
        let body = body_json(&err);
        assert_eq!(err.error_response().status().as_u16(), 422);
        assert_eq!(body["error"], "VIDEO_HOST_ERROR");
        assert_eq!(
            body["errors"]["asset_id"][0],
            VideoHostError::NoCaptions.user_message()
        );
    }

    #[test]
    fn test_forbidden_status() {
        let err = AppError::Forbidden("Admin role required".to_string());
        assert_eq!(err.error_response().status().as_u16(), 403);
    }
}
