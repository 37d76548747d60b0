use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use tracing::error;

use crate::document::AssembleError;
use crate::upload::UploadRejection;
use crate::upstream::UpstreamError;

pub type AppResult<T> = Result<T, AppError>;

pub const E_UNAUTHORIZED_ACCESS: &str = "E_UNAUTHORIZED_ACCESS";
pub const E_VALIDATION_FAILED: &str = "E_VALIDATION_FAILED";
pub const E_ROW_NOT_FOUND: &str = "E_ROW_NOT_FOUND";
pub const E_UPSTREAM_UNAVAILABLE: &str = "E_UPSTREAM_UNAVAILABLE";
pub const E_INTERNAL_SERVER_ERROR: &str = "E_INTERNAL_SERVER_ERROR";

const UPSTREAM_UNAVAILABLE_MESSAGE: &str =
    "The service is temporarily unavailable. Please try again later.";

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    passthrough: Option<Value>,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            passthrough: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            E_UNAUTHORIZED_ACCESS,
            "Unauthorized access",
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, E_VALIDATION_FAILED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, E_ROW_NOT_FOUND, message)
    }

    pub fn upstream_unavailable() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            E_UPSTREAM_UNAVAILABLE,
            UPSTREAM_UNAVAILABLE_MESSAGE,
        )
    }

    pub fn internal<E: Display>(error: E) -> Self {
        error!(error = %error, "internal gateway error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            E_INTERNAL_SERVER_ERROR,
            "Internal server error",
        )
    }

    /// Relays an upstream error reply untouched so callers can render its detail.
    pub fn upstream_rejected(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            code: "",
            message: String::new(),
            passthrough: Some(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        if let Some(body) = self.passthrough {
            if body.is_null() {
                return status.into_response();
            }
            return (status, Json(body)).into_response();
        }
        let body = Json(ErrorResponse {
            error: self.code,
            message: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl From<UpstreamError> for AppError {
    fn from(value: UpstreamError) -> Self {
        error!(error = %value, "upstream call failed");
        AppError::upstream_unavailable()
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        AppError::validation(value.body_text())
    }
}

impl From<UploadRejection> for AppError {
    fn from(value: UploadRejection) -> Self {
        AppError::validation(value.to_string())
    }
}

impl From<AssembleError> for AppError {
    fn from(value: AssembleError) -> Self {
        match value {
            AssembleError::RecordNotFound(_) => AppError::not_found(value.to_string()),
            AssembleError::Malformed(_) => {
                error!(error = %value, "upstream record could not be decoded");
                AppError::upstream_unavailable()
            }
        }
    }
}
