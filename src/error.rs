use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Structured validation errors with field-level error mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationErrors {
    Single { field: String, message: String },
    Multiple { fields: HashMap<String, String> },
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationErrors::Single { field, message } => write!(f, "{field}: {message}"),
            ValidationErrors::Multiple { fields } => {
                let errors: Vec<String> = fields
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect();
                write!(f, "Validation errors: {}", errors.join(", "))
            }
        }
    }
}

/// The taxonomy from the error handling design: every variant maps to exactly
/// one HTTP status and error code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Visibility forbidden: {0}")]
    ForbiddenVisibility(String),

    #[error("Role forbidden: {0}")]
    ForbiddenRole(String),

    #[error("Scope forbidden: {0}")]
    ForbiddenScope(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn create_error_body(msg: String, code: &str) -> serde_json::Value {
    serde_json::json!({ "error": msg, "code": code })
}

fn log_error(error: &Error, error_code: &str, status_code: u16) {
    if status_code >= 500 {
        tracing::error!(error_code, error = %error, status_code, "error returned to client");
    } else {
        tracing::warn!(error_code, error = %error, status_code, "error returned to client");
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        log_error(&self, self.error_code(), self.status_code());

        let (body, status) = match self {
            Error::Validation(errors) => {
                let body = match errors {
                    ValidationErrors::Single { field, message } => serde_json::json!({
                        "error": "Validation failed",
                        "code": "VALIDATION_ERROR",
                        "fields": { field: message }
                    }),
                    ValidationErrors::Multiple { fields } => serde_json::json!({
                        "error": "Validation failed",
                        "code": "VALIDATION_ERROR",
                        "fields": fields
                    }),
                };
                (body, StatusCode::BAD_REQUEST)
            }
            Error::UnknownModel(m) => (
                create_error_body(format!("Unknown model: {m}"), "UNKNOWN_MODEL"),
                StatusCode::BAD_REQUEST,
            ),
            Error::UnsupportedFileType(t) => (
                create_error_body(format!("Unsupported file type: {t}"), "UNSUPPORTED_FILE_TYPE"),
                StatusCode::BAD_REQUEST,
            ),
            Error::ForbiddenVisibility(msg) => (
                create_error_body(msg, "FORBIDDEN_VISIBILITY"),
                StatusCode::FORBIDDEN,
            ),
            Error::ForbiddenRole(msg) => {
                (create_error_body(msg, "FORBIDDEN_ROLE"), StatusCode::FORBIDDEN)
            }
            Error::ForbiddenScope(msg) => (
                create_error_body(msg, "FORBIDDEN_SCOPE"),
                StatusCode::FORBIDDEN,
            ),
            Error::NotFound(msg) => (create_error_body(msg, "NOT_FOUND"), StatusCode::NOT_FOUND),
            Error::AuthFailure(msg) => (
                create_error_body(msg, "AUTH_FAILURE"),
                StatusCode::UNAUTHORIZED,
            ),
            Error::ProviderError(msg) => (
                create_error_body(msg, "PROVIDER_ERROR"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            Error::StorageError(msg) => (
                create_error_body(msg, "STORAGE_ERROR"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            Error::Config(_) => (
                create_error_body("Configuration error".to_string(), "CONFIG_ERROR"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            Error::Json(e) => (
                create_error_body(format!("Invalid JSON payload: {e}"), "VALIDATION_ERROR"),
                StatusCode::BAD_REQUEST,
            ),
            Error::Internal(msg) => (
                create_error_body(msg, "INTERNAL_ERROR"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::UnknownModel(_) => 400,
            Error::UnsupportedFileType(_) => 400,
            Error::ForbiddenVisibility(_) | Error::ForbiddenRole(_) | Error::ForbiddenScope(_) => 403,
            Error::NotFound(_) => 404,
            Error::AuthFailure(_) => 401,
            Error::ProviderError(_) => 500,
            Error::StorageError(_) => 500,
            Error::Config(_) => 500,
            Error::Json(_) => 400,
            Error::Internal(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::UnknownModel(_) => "UNKNOWN_MODEL",
            Error::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Error::ForbiddenVisibility(_) => "FORBIDDEN_VISIBILITY",
            Error::ForbiddenRole(_) => "FORBIDDEN_ROLE",
            Error::ForbiddenScope(_) => "FORBIDDEN_SCOPE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::AuthFailure(_) => "AUTH_FAILURE",
            Error::ProviderError(_) => "PROVIDER_ERROR",
            Error::StorageError(_) => "STORAGE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
