//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowers, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Lending API",
        version = "0.1.0",
        description = "Catalog, borrower registry and loan ledger"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Borrowers
        borrowers::register_borrower,
        borrowers::get_borrower,
        // Books
        books::register_book,
        books::list_books,
        books::get_book,
        // Loans
        loans::borrow_book,
        loans::return_book,
    ),
    components(
        schemas(
            // Borrowers
            borrowers::BorrowerRegistrationRequest,
            crate::models::borrower::Borrower,
            // Books
            books::BookRegistrationRequest,
            books::BookResponse,
            // Loans
            loans::LoanOperation,
            loans::BorrowOperationResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "borrowers", description = "Borrower registry"),
        (name = "books", description = "Catalog"),
        (name = "loans", description = "Borrow and return")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
