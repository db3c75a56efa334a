//! Loan ledger repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::models::{LoanRecord, NewLoan};

use super::{violates, StoreError, StoreResult};

/// Partial unique index on `book_id WHERE returned_at IS NULL`
const ONE_ACTIVE_PER_BOOK_INDEX: &str = "loan_records_one_active_per_book";

const LOAN_COLUMNS: &str = "id, borrower_id, book_id, borrowed_at, returned_at";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Active loan for a book, if any
    pub async fn find_active_by_book(&self, book_id: i64) -> StoreResult<Option<LoanRecord>> {
        let loan = sqlx::query_as::<_, LoanRecord>(&format!(
            "SELECT {} FROM loan_records WHERE book_id = $1 AND returned_at IS NULL",
            LOAN_COLUMNS
        ))
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Active loan for a borrower/book pair, if any
    pub async fn find_active_by_borrower_and_book(
        &self,
        borrower_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<LoanRecord>> {
        let loan = sqlx::query_as::<_, LoanRecord>(&format!(
            "SELECT {} FROM loan_records \
             WHERE borrower_id = $1 AND book_id = $2 AND returned_at IS NULL",
            LOAN_COLUMNS
        ))
        .bind(borrower_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// All loans still out
    pub async fn list_active(&self) -> StoreResult<Vec<LoanRecord>> {
        let loans = sqlx::query_as::<_, LoanRecord>(&format!(
            "SELECT {} FROM loan_records WHERE returned_at IS NULL ORDER BY id",
            LOAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Create an active loan. Two racing borrowers of the same book both
    /// reach this insert; the partial unique index lets exactly one through.
    pub async fn insert_active(&self, loan: &NewLoan) -> StoreResult<LoanRecord> {
        let result = sqlx::query_as::<_, LoanRecord>(&format!(
            r#"
            INSERT INTO loan_records (borrower_id, book_id, borrowed_at)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan.borrower_id)
        .bind(loan.book_id)
        .bind(loan.borrowed_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if violates(&e, ONE_ACTIVE_PER_BOOK_INDEX) => {
                tracing::debug!(book_id = loan.book_id, "Active loan guard rejected insert");
                Err(StoreError::ActiveLoanExists {
                    book_id: loan.book_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Close an active loan. The `returned_at IS NULL` predicate makes a
    /// second concurrent return update zero rows.
    pub async fn close(&self, loan_id: i64, returned_at: DateTime<Utc>) -> StoreResult<LoanRecord> {
        let closed = sqlx::query_as::<_, LoanRecord>(&format!(
            r#"
            UPDATE loan_records
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan_id)
        .bind(returned_at)
        .fetch_optional(&self.pool)
        .await?;

        closed.ok_or_else(|| {
            tracing::debug!(loan_id, "Return guard found loan already closed");
            StoreError::LoanNotActive { loan_id }
        })
    }
}
