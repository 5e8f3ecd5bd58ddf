use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::email::{DispatchError, ErrorKind};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },
}

/// Uniform error body: `{"error": ..., "message": ...}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Generic body for failures that escape every other category
pub const UNHANDLED_ERROR: &str = "Internal server error";
pub const UNHANDLED_MESSAGE: &str = "Something went wrong";

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn unhandled() -> Self {
        Self::new(UNHANDLED_ERROR, UNHANDLED_MESSAGE)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Dispatch(e) if e.kind == ErrorKind::Validation => StatusCode::BAD_REQUEST,
            AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            AppError::InvalidBody(msg) => ErrorResponse::new("Invalid request body", msg.clone()),
            AppError::Dispatch(e) => {
                let error = match e.kind {
                    ErrorKind::Validation => "Missing required fields",
                    ErrorKind::TemplateNotFound => "Template not found",
                    ErrorKind::TemplateCompile => "Template error",
                    ErrorKind::Transport => "Failed to send email",
                };
                ErrorResponse::new(error, e.detail.clone())
            }
            AppError::RouteNotFound { method, path } => {
                ErrorResponse::new("Route not found", format!("Cannot {} {}", method, path))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Always log the detailed error server-side
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "API error");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %self, "API request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
