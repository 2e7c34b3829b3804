//! Error types for Toolroom server

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes returned alongside the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NoSuchData = 3,
    BadValue = 4,
    InsufficientQuantity = 5,
    Duplicate = 6,
    HasActiveAssignments = 7,
    AlreadyCheckedIn = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not enough quantity for tool {tool_id} (requested {requested}, available {available})")]
    InsufficientQuantity {
        tool_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Active assignments: {0}")]
    HasActiveAssignments(String),

    #[error("Assignment {0} is already checked in")]
    AlreadyCheckedIn(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Offending tool for insufficient-quantity failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<i64>,
}

impl AppError {
    /// HTTP status and error code for this error
    pub fn status(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::InsufficientQuantity { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::InsufficientQuantity)
            }
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, ErrorCode::Duplicate),
            AppError::HasActiveAssignments(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::HasActiveAssignments)
            }
            AppError::AlreadyCheckedIn(_) => (StatusCode::BAD_REQUEST, ErrorCode::AlreadyCheckedIn),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Serialization(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = match &self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::HasActiveAssignments(msg) => msg.clone(),
            AppError::InsufficientQuantity { .. } | AppError::AlreadyCheckedIn(_) => self.to_string(),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!("Stored data could not be decoded: {}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let tool_id = match &self {
            AppError::InsufficientQuantity { tool_id, .. } => Some(*tool_id),
            _ => None,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            tool_id,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", e))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
