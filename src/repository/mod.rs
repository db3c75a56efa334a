//! Ledger store: persistence contract for books, borrowers and loan records

pub mod books;
pub mod borrowers;
pub mod loans;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use thiserror::Error;

use crate::models::{Book, Borrower, LoanRecord, NewBook, NewBorrower, NewLoan};

pub use memory::MemoryLedger;

/// Errors raised by a ledger store.
///
/// The first four variants are guard rejections: the store refused a write
/// that would break a catalog, borrower or loan invariant.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("ISBN {} is registered as {} by {}", .existing.isbn, .existing.title, .existing.author)]
    IsbnConflict {
        existing: Book,
        title: String,
        author: String,
    },

    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    #[error("Book {book_id} already has an active loan")]
    ActiveLoanExists { book_id: i64 },

    #[error("Loan {loan_id} is not active")]
    LoanNotActive { loan_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query/command contract the registries and the lending coordinator rely on.
///
/// Every `insert_*`/`close_loan` call is atomic with respect to its own
/// invariant, so a check made earlier by the caller may be stale but the
/// write can never break the invariant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Books carrying exactly this ISBN, lowest id first
    async fn find_books_by_isbn(&self, isbn: &str) -> StoreResult<Vec<Book>>;

    /// Insert a book; rejects with `IsbnConflict` when the first book already
    /// carrying the ISBN has a different title or author.
    async fn insert_book(&self, book: NewBook) -> StoreResult<Book>;

    async fn find_book_by_id(&self, id: i64) -> StoreResult<Option<Book>>;

    /// All books in insertion order
    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    async fn find_borrower_by_email(&self, email: &str) -> StoreResult<Option<Borrower>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Insert a borrower; rejects with `DuplicateEmail` on a taken email
    async fn insert_borrower(&self, borrower: NewBorrower) -> StoreResult<Borrower>;

    async fn find_borrower_by_id(&self, id: i64) -> StoreResult<Option<Borrower>>;

    async fn find_active_loan_by_book(&self, book_id: i64) -> StoreResult<Option<LoanRecord>>;

    async fn find_active_loan_by_borrower_and_book(
        &self,
        borrower_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<LoanRecord>>;

    async fn list_active_loans(&self) -> StoreResult<Vec<LoanRecord>>;

    /// Insert an active loan; rejects with `ActiveLoanExists` if the book
    /// already has one.
    async fn insert_active_loan(&self, loan: NewLoan) -> StoreResult<LoanRecord>;

    /// Set `returned_at` on an active loan; rejects with `LoanNotActive` if
    /// the loan was already closed.
    async fn close_loan(&self, loan_id: i64, returned_at: DateTime<Utc>) -> StoreResult<LoanRecord>;

    /// Cheap connectivity probe used by the readiness endpoint
    async fn ping(&self) -> StoreResult<()>;
}

/// Shared handle to the ledger store used by every service
pub type SharedStore = Arc<dyn LedgerStore>;

/// PostgreSQL ledger store holding one repository per table
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            borrowers: borrowers::BorrowersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl LedgerStore for Repository {
    async fn find_books_by_isbn(&self, isbn: &str) -> StoreResult<Vec<Book>> {
        self.books.find_by_isbn(isbn).await
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<Book> {
        self.books.insert_consistent(&book).await
    }

    async fn find_book_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        self.books.find_by_id(id).await
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        self.books.list().await
    }

    async fn find_borrower_by_email(&self, email: &str) -> StoreResult<Option<Borrower>> {
        self.borrowers.find_by_email(email).await
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.borrowers.email_exists(email).await
    }

    async fn insert_borrower(&self, borrower: NewBorrower) -> StoreResult<Borrower> {
        self.borrowers.insert(&borrower).await
    }

    async fn find_borrower_by_id(&self, id: i64) -> StoreResult<Option<Borrower>> {
        self.borrowers.find_by_id(id).await
    }

    async fn find_active_loan_by_book(&self, book_id: i64) -> StoreResult<Option<LoanRecord>> {
        self.loans.find_active_by_book(book_id).await
    }

    async fn find_active_loan_by_borrower_and_book(
        &self,
        borrower_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<LoanRecord>> {
        self.loans
            .find_active_by_borrower_and_book(borrower_id, book_id)
            .await
    }

    async fn list_active_loans(&self) -> StoreResult<Vec<LoanRecord>> {
        self.loans.list_active().await
    }

    async fn insert_active_loan(&self, loan: NewLoan) -> StoreResult<LoanRecord> {
        self.loans.insert_active(&loan).await
    }

    async fn close_loan(&self, loan_id: i64, returned_at: DateTime<Utc>) -> StoreResult<LoanRecord> {
        self.loans.close(loan_id, returned_at).await
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// True when `err` is a unique violation of the named index or constraint
pub(crate) fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}
