//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Catalog entry. Several rows may share an ISBN (physical copies of the
/// same work) as long as title and author agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub author: String,
}

/// Book not yet persisted; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
}

/// Loan state of a book, derived from the ledger and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookAvailability {
    Available,
    Borrowed {
        borrower_id: i64,
        since: DateTime<Utc>,
    },
}

impl BookAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, BookAvailability::Available)
    }
}
