//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;
use crate::uow::UowError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Coordinator errors other than storage failures
    #[error(transparent)]
    Uow(UowError),
}

impl From<UowError> for AppError {
    fn from(err: UowError) -> Self {
        match err {
            UowError::Store(e) => AppError::Store(e),
            other => AppError::Uow(other),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Domain(domain_err) => {
                let code = match domain_err {
                    DomainError::InvalidAmount(_) => "invalid_amount",
                    DomainError::InsufficientFunds { .. } => "insufficient_funds",
                    DomainError::BalanceOverflow => "balance_overflow",
                    DomainError::SameAccountTransfer => "same_account_transfer",
                    DomainError::InvalidName => "invalid_name",
                    DomainError::InvalidEmail => "invalid_email",
                };
                (StatusCode::BAD_REQUEST, code, Some(domain_err.to_string()))
            }

            AppError::Store(store_err) => match store_err {
                StoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    Some(format!("{} {}", entity, id)),
                ),
                StoreError::Conflict { .. } => {
                    (StatusCode::CONFLICT, "concurrency_conflict", None)
                }
                StoreError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
                StoreError::ScopeClosed | StoreError::Corrupt(_) => {
                    tracing::error!("Store error: {}", store_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
                }
            },

            AppError::Uow(UowError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "cancelled", None)
            }
            AppError::Uow(uow_err) => {
                tracing::error!("Unit of work error: {}", uow_err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
