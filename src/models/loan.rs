//! Loan (borrow) record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One entry of the loan ledger.
///
/// Created active (`returned_at` is `None`) by a borrow and closed exactly
/// once by a return. Records are never deleted. At most one active record
/// exists per `book_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRecord {
    pub id: i64,
    pub borrower_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanRecord {
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Active loan to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub borrower_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
}
