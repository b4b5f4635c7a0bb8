//! Application error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use taskhive_core::CoreError;
use taskhive_core::error::TENANT_REQUIRED;
use thiserror::Error;
use tracing::error;

use crate::envelope::{ApiResponse, ValidationDetails};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Code attached to a tenant-required login failure.
pub const TENANT_REQUIRED_CODE: &str = "TENANT_REQUIRED";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    Unauthorized(String),

    /// Request that axum could not extract (malformed JSON, path or query).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(e) => match e {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::Unauthorized(_) | CoreError::TenantRequired => StatusCode::UNAUTHORIZED,
                CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Core(CoreError::Validation(fields)) => {
                let body = ApiResponse::<()>::failure("Invalid input").with_data(ValidationDetails {
                    field_errors: fields,
                });
                (status, Json(body)).into_response()
            }
            AppError::Core(CoreError::TenantRequired) => {
                let body = ApiResponse::<()>::failure(TENANT_REQUIRED).with_code(TENANT_REQUIRED_CODE);
                (status, Json(body)).into_response()
            }
            AppError::Core(CoreError::Internal(detail)) => {
                error!(error = %detail, "request failed");
                (status, Json(ApiResponse::<()>::failure("Internal server error"))).into_response()
            }
            other => (status, Json(ApiResponse::<()>::failure(other.to_string()))).into_response(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        // Malformed and mistyped bodies are both plain bad requests.
        let status = match &e {
            JsonRejection::MissingJsonContentType(_) => e.status(),
            _ => StatusCode::BAD_REQUEST,
        };
        AppError::Rejected {
            status,
            message: e.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::Rejected {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::Rejected {
            status: e.status(),
            message: e.body_text(),
        }
    }
}
