//! Catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Book, BookAvailability},
    AppState,
};

use super::validate_request;

/// Register book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookRegistrationRequest {
    /// ISBN-10 or ISBN-13, hyphens and spaces allowed
    #[validate(length(min = 10, max = 17, message = "ISBN must be between 10 and 17 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be between 1 and 255 characters"))]
    pub author: String,
}

/// Book with its current loan state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub is_available: bool,
}

impl BookResponse {
    fn new(book: Book, availability: BookAvailability) -> Self {
        Self {
            id: book.id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            is_available: availability.is_available(),
        }
    }
}

/// Register a new book
#[utoipa::path(
    post,
    path = "/api/library/books",
    tag = "books",
    request_body = BookRegistrationRequest,
    responses(
        (status = 201, description = "Book registered", body = BookResponse),
        (status = 400, description = "Invalid input or ISBN reused with another title/author", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_book(
    State(state): State<AppState>,
    Json(request): Json<BookRegistrationRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    validate_request(&request)?;

    let book = state
        .services
        .catalog
        .register_book(&request.isbn, &request.title, &request.author)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse::new(book, BookAvailability::Available)),
    ))
}

/// List every book in the catalog
#[utoipa::path(
    get,
    path = "/api/library/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<BookResponse>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.catalog.get_all_books().await?;
    let borrowed = state.services.lending.borrowed_books().await?;

    let response = books
        .into_iter()
        .map(|book| {
            let availability = borrowed
                .get(&book.id)
                .copied()
                .unwrap_or(BookAvailability::Available);
            BookResponse::new(book, availability)
        })
        .collect();

    Ok(Json(response))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/api/library/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.get_book_by_id(Some(id)).await?;
    let availability = state.services.lending.availability(book.id).await?;

    Ok(Json(BookResponse::new(book, availability)))
}
