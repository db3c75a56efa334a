//! Borrower model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Registered library borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i64,
    pub name: String,
    /// Unique across all borrowers
    pub email: String,
}

/// Borrower not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    pub name: String,
    pub email: String,
}
