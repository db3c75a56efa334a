//! API handlers for the lending REST endpoints

pub mod books;
pub mod borrowers;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Prefix shared by every library endpoint
pub const API_PREFIX: &str = "/api/library";

/// Run the request DTO's field rules before handing it to the services
pub(crate) fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    request.validate().map_err(|e| {
        let fields = e
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let message = errors
                    .first()
                    .map(|err| match &err.message {
                        Some(message) => message.to_string(),
                        None => err.code.to_string(),
                    })
                    .unwrap_or_default();
                (field.to_string(), message)
            })
            .collect();
        AppError::InvalidFields(fields)
    })
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let library = Router::new()
        // Borrowers
        .route("/borrowers", post(borrowers::register_borrower))
        .route("/borrowers/:id", get(borrowers::get_borrower))
        // Books
        .route("/books", post(books::register_book).get(books::list_books))
        .route("/books/:id", get(books::get_book))
        // Loans
        .route("/borrow/:borrower_id/:book_id", post(loans::borrow_book))
        .route("/return/:borrower_id/:book_id", post(loans::return_book));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest(API_PREFIX, library)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
