//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::LoanRecord, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanOperation {
    Borrowed,
    Returned,
}

/// Outcome of a borrow or return
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BorrowOperationResponse {
    pub borrow_record_id: i64,
    pub borrower_id: i64,
    pub borrower_name: String,
    pub book_id: i64,
    pub book_title: String,
    pub book_author: String,
    /// Borrow time for a borrow, return time for a return
    pub operation_date: DateTime<Utc>,
    pub operation: LoanOperation,
    pub message: String,
}

async fn describe(
    state: &AppState,
    loan: LoanRecord,
    operation: LoanOperation,
) -> AppResult<BorrowOperationResponse> {
    let borrower = state
        .services
        .borrowers
        .get_borrower_by_id(Some(loan.borrower_id))
        .await?;
    let book = state.services.catalog.get_book_by_id(Some(loan.book_id)).await?;

    let (operation_date, verb) = match operation {
        LoanOperation::Borrowed => (loan.borrowed_at, "borrowed"),
        LoanOperation::Returned => (loan.returned_at.unwrap_or_else(Utc::now), "returned"),
    };

    Ok(BorrowOperationResponse {
        borrow_record_id: loan.id,
        borrower_id: borrower.id,
        message: format!(
            "Book '{}' has been successfully {} by {}",
            book.title, verb, borrower.name
        ),
        borrower_name: borrower.name,
        book_id: book.id,
        book_title: book.title,
        book_author: book.author,
        operation_date,
        operation,
    })
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/api/library/borrow/{borrower_id}/{book_id}",
    tag = "loans",
    params(
        ("borrower_id" = i64, Path, description = "ID of the borrower"),
        ("book_id" = i64, Path, description = "ID of the book to borrow")
    ),
    responses(
        (status = 201, description = "Book borrowed", body = BorrowOperationResponse),
        (status = 404, description = "Borrower or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Path((borrower_id, book_id)): Path<(i64, i64)>,
) -> AppResult<(StatusCode, Json<BorrowOperationResponse>)> {
    let loan = state
        .services
        .lending
        .borrow_book(Some(borrower_id), Some(book_id))
        .await?;

    let response = describe(&state, loan, LoanOperation::Borrowed).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/api/library/return/{borrower_id}/{book_id}",
    tag = "loans",
    params(
        ("borrower_id" = i64, Path, description = "ID of the borrower"),
        ("book_id" = i64, Path, description = "ID of the book to return")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowOperationResponse),
        (status = 404, description = "Borrower or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No active borrow record for this borrower and book", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    Path((borrower_id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<BorrowOperationResponse>> {
    let loan = state
        .services
        .lending
        .return_book(Some(borrower_id), Some(book_id))
        .await?;

    let response = describe(&state, loan, LoanOperation::Returned).await?;
    Ok(Json(response))
}
