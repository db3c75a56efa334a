//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::models::{Book, NewBook};

use super::{StoreError, StoreResult};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, isbn, title, author FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Books sharing an ISBN, oldest first
    pub async fn find_by_isbn(&self, isbn: &str) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, isbn, title, author FROM books WHERE isbn = $1 ORDER BY id",
        )
        .bind(isbn)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// List every book in insertion order
    pub async fn list(&self) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT id, isbn, title, author FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Insert a book while holding a transaction-scoped advisory lock on its
    /// ISBN, so the consistency check and the insert cannot interleave with a
    /// concurrent registration of the same ISBN.
    pub async fn insert_consistent(&self, book: &NewBook) -> StoreResult<Book> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&book.isbn)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, Book>(
            "SELECT id, isbn, title, author FROM books WHERE isbn = $1 ORDER BY id LIMIT 1",
        )
        .bind(&book.isbn)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            if existing.title != book.title || existing.author != book.author {
                tracing::debug!(isbn = %book.isbn, existing_id = existing.id, "ISBN guard rejected insert");
                // Dropping the transaction rolls it back and releases the lock
                return Err(StoreError::IsbnConflict {
                    existing,
                    title: book.title.clone(),
                    author: book.author.clone(),
                });
            }
        }

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author)
            VALUES ($1, $2, $3)
            RETURNING id, isbn, title, author
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }
}
