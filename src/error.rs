//! Error types and HTTP error response handling.
//!
//! `AppError` is what the service layer returns. It wraps the domain and
//! repository errors and knows how to turn itself into an HTTP response
//! with a JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    models::{CardNumber, DomainError},
    repositories::RepositoryError,
};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Business Rule Errors**: the card refused the operation
/// - **Resource Errors**: no card with that number
/// - **Concurrency Errors**: the card changed while we were working on it
/// - **Validation Errors**: request values we could not interpret
/// - **Storage Errors**: database failures or unreadable stored data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No card is stored under this number.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Card {0} not found")]
    CardNotFound(CardNumber),

    /// The card was saved by someone else after we loaded it.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Card {0} was modified concurrently, retry the operation")]
    ConcurrentModification(CardNumber),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage failed (connection error, query error, corrupt row).
    ///
    /// Returns HTTP 500; details stay in the logs.
    #[error("Storage error: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(number) => AppError::CardNotFound(number),
            RepositoryError::VersionConflict { number, .. } => {
                AppError::ConcurrentModification(number)
            }
            other => AppError::Storage(other),
        }
    }
}

impl AppError {
    /// HTTP status, error code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Domain(error) => {
                let status = match error {
                    DomainError::NegativeAmount | DomainError::InvalidCurrency(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    DomainError::CorruptState(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, error.code(), error.to_string())
            }
            AppError::CardNotFound(_) => (StatusCode::NOT_FOUND, "card_not_found", self.to_string()),
            AppError::ConcurrentModification(_) => {
                (StatusCode::CONFLICT, "concurrent_modification", self.to_string())
            }
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "insufficient_funds",
///     "message": "The card has insufficient funds"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `NegativeAmount`, `InvalidCurrency`, `InvalidRequest` → 400 Bad Request
/// - `CardNotFound` → 404 Not Found
/// - `ConcurrentModification` → 409 Conflict
/// - other domain errors → 422 Unprocessable Entity
/// - `Storage` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
