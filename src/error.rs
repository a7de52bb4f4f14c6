use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by registration and matchmaking operations
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input. Nothing was written.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced event or profile does not exist. Nothing was written.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A data store call on the primary write path failed
    #[error("Dependency failure: {0}")]
    Dependency(#[from] StoreError),
}

impl AppError {
    fn label(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Dependency(_) => "dependency_failure",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.label().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
