//! Borrower endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppResult, models::Borrower, AppState};

use super::validate_request;

/// Register borrower request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BorrowerRegistrationRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email should be valid"))]
    pub email: String,
}

/// Register a new borrower
#[utoipa::path(
    post,
    path = "/api/library/borrowers",
    tag = "borrowers",
    request_body = BorrowerRegistrationRequest,
    responses(
        (status = 201, description = "Borrower registered", body = Borrower),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_borrower(
    State(state): State<AppState>,
    Json(request): Json<BorrowerRegistrationRequest>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    validate_request(&request)?;

    let borrower = state
        .services
        .borrowers
        .register_borrower(&request.name, &request.email)
        .await?;

    Ok((StatusCode::CREATED, Json(borrower)))
}

/// Get borrower details by ID
#[utoipa::path(
    get,
    path = "/api/library/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = i64, Path, description = "Borrower ID")
    ),
    responses(
        (status = 200, description = "Borrower details", body = Borrower),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_borrower(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get_borrower_by_id(Some(id)).await?;
    Ok(Json(borrower))
}
