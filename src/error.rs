//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(d) => AppError::Domain(d),
            StoreError::Database(d) => AppError::Database(d),
        }
    }
}

/// Error response body. `field` labels the offending form field for
/// validation rejections.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, field, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                None,
                Some(msg.clone()),
            ),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(ref domain_err) => match domain_err {
                DomainError::Validation { field, .. } => (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    Some(*field),
                    Some(domain_err.to_string()),
                ),
                DomainError::InsufficientBalance { .. } => (
                    StatusCode::BAD_REQUEST,
                    "insufficient_balance",
                    Some("amount"),
                    Some(domain_err.to_string()),
                ),
                DomainError::ReceiverNotFound(_) => (
                    StatusCode::BAD_REQUEST,
                    "receiver_not_found",
                    Some("receiver"),
                    Some(domain_err.to_string()),
                ),
                DomainError::AccountNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "account_not_found",
                    None,
                    Some(id.to_string()),
                ),
                DomainError::LoanNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "loan_not_found",
                    None,
                    Some(id.to_string()),
                ),
                DomainError::LoanLimitReached { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "loan_limit_reached",
                    None,
                    Some(domain_err.to_string()),
                ),
                DomainError::LoanNotApproved(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "loan_not_approved",
                    None,
                    Some(domain_err.to_string()),
                ),
                DomainError::LoanAlreadyApproved(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "loan_already_approved",
                    None,
                    Some(domain_err.to_string()),
                ),
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            field,
            details,
        };

        (status, Json(body)).into_response()
    }
}
