//! Borrowers repository for database operations

use sqlx::{Pool, Postgres};

use crate::models::{Borrower, NewBorrower};

use super::{violates, StoreError, StoreResult};

/// Unique index backing email uniqueness (see migrations)
const EMAIL_UNIQUE_INDEX: &str = "borrowers_email_key";

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrower by ID
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, email FROM borrowers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrower)
    }

    /// Get borrower by email
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, email FROM borrowers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrower)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Insert a borrower; the unique index decides concurrent duplicates
    pub async fn insert(&self, borrower: &NewBorrower) -> StoreResult<Borrower> {
        let result = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&borrower.name)
        .bind(&borrower.email)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if violates(&e, EMAIL_UNIQUE_INDEX) => {
                tracing::debug!(email = %borrower.email, "Email guard rejected insert");
                Err(StoreError::DuplicateEmail(borrower.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
