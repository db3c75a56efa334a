//! Error types for the lending server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::repository::StoreError;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input, including registry consistency rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body failed its field rules; maps each field to its first message
    #[error("Validation failed: {0:?}")]
    InvalidFields(BTreeMap<String, String>),

    /// Referenced borrower or book does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested loan transition is not currently legal
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected ledger store failure, passed through untouched
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl AppError {
    /// Message without the variant prefix, as shown to API clients
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::InvalidFields(_) => "Validation failed".to_string(),
            AppError::Store(e) => e.to_string(),
        }
    }
}

/// Guard rejections are folded into the same variants the pre-checks produce,
/// so callers cannot tell a lost race from a checked conflict.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveLoanExists { book_id } => {
                AppError::Conflict(format!("Book with ID {} is already borrowed", book_id))
            }
            StoreError::LoanNotActive { loan_id } => {
                AppError::Conflict(format!("Loan {} has already been returned", loan_id))
            }
            StoreError::DuplicateEmail(email) => {
                AppError::Validation(format!("Email already exists: {}", email))
            }
            StoreError::IsbnConflict { existing, title, author } => {
                AppError::Validation(isbn_mismatch_message(
                    &existing.title,
                    &existing.author,
                    &title,
                    &author,
                ))
            }
            other => AppError::Store(other),
        }
    }
}

/// Message used for both the pre-check and the store guard on ISBN reuse
pub fn isbn_mismatch_message(
    existing_title: &str,
    existing_author: &str,
    title: &str,
    author: &str,
) -> String {
    format!(
        "Books with the same ISBN must have the same title and author. \
         Existing: {} by {}, New: {} by {}",
        existing_title, existing_author, title, author
    )
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    /// Per-field messages, present only when a request body failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let errors = match &self {
            AppError::InvalidFields(fields) => Some(fields.clone()),
            _ => None,
        };

        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidFields(_) => (StatusCode::BAD_REQUEST, self.message()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Ledger store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
            errors,
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::Book;

    #[test]
    fn test_guard_rejections_are_normalized() {
        let err: AppError = StoreError::ActiveLoanExists { book_id: 7 }.into();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Book with ID 7 is already borrowed"));

        let err: AppError = StoreError::LoanNotActive { loan_id: 3 }.into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = StoreError::DuplicateEmail("a@x.com".to_string()).into();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Email already exists: a@x.com"));
    }

    #[test]
    fn test_isbn_conflict_names_both_books() {
        let existing = Book {
            id: 1,
            isbn: "978-0134685991".to_string(),
            title: "Effective Java".to_string(),
            author: "Joshua Bloch".to_string(),
        };
        let err: AppError = StoreError::IsbnConflict {
            existing,
            title: "Other Title".to_string(),
            author: "Joshua Bloch".to_string(),
        }
        .into();
        let message = err.message();
        assert!(message.contains("Effective Java by Joshua Bloch"));
        assert!(message.contains("Other Title by Joshua Bloch"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidFields(BTreeMap::new()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
