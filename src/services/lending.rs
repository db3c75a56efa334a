//! Lending coordinator: borrow and return.
//!
//! A book is either *available* (no active loan) or *borrowed* (exactly one
//! active loan). That state is never stored; it is read back from the loan
//! ledger on every request. The availability check below only produces the
//! friendly error early: the store's guarded insert and guarded close are
//! what keep the one-active-loan-per-book invariant under concurrency.

use std::collections::HashMap;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookAvailability, Borrower, LoanRecord, NewLoan},
    repository::{SharedStore, StoreError},
};

use super::{borrowers::BorrowerService, catalog::CatalogService};

fn already_borrowed(book_id: i64) -> AppError {
    AppError::Conflict(format!("Book with ID {} is already borrowed", book_id))
}

fn no_active_loan(borrower_id: i64, book_id: i64) -> AppError {
    AppError::Conflict(format!(
        "No active borrow record found for borrower {} and book {}",
        borrower_id, book_id
    ))
}

fn availability_of(loan: Option<&LoanRecord>) -> BookAvailability {
    match loan {
        Some(loan) => BookAvailability::Borrowed {
            borrower_id: loan.borrower_id,
            since: loan.borrowed_at,
        },
        None => BookAvailability::Available,
    }
}

#[derive(Clone)]
pub struct LendingService {
    store: SharedStore,
    catalog: CatalogService,
    borrowers: BorrowerService,
}

impl LendingService {
    pub fn new(store: SharedStore, catalog: CatalogService, borrowers: BorrowerService) -> Self {
        Self {
            store,
            catalog,
            borrowers,
        }
    }

    /// Lend a book to a borrower
    pub async fn borrow_book(
        &self,
        borrower_id: Option<i64>,
        book_id: Option<i64>,
    ) -> AppResult<LoanRecord> {
        let (borrower, book) = self.resolve_parties(borrower_id, book_id).await?;

        if self.store.find_active_loan_by_book(book.id).await?.is_some() {
            return Err(already_borrowed(book.id));
        }

        let loan = NewLoan {
            borrower_id: borrower.id,
            book_id: book.id,
            borrowed_at: Utc::now(),
        };

        self.store
            .insert_active_loan(loan)
            .await
            .map_err(|e| match e {
                StoreError::ActiveLoanExists { book_id } => already_borrowed(book_id),
                other => other.into(),
            })
    }

    /// Take back a book from the borrower currently holding it.
    ///
    /// The loan must belong to exactly this borrower/book pair; a book held
    /// by someone else is not returnable through another borrower's id.
    pub async fn return_book(
        &self,
        borrower_id: Option<i64>,
        book_id: Option<i64>,
    ) -> AppResult<LoanRecord> {
        let (borrower, book) = self.resolve_parties(borrower_id, book_id).await?;

        let loan = self
            .store
            .find_active_loan_by_borrower_and_book(borrower.id, book.id)
            .await?
            .ok_or_else(|| no_active_loan(borrower.id, book.id))?;

        self.store
            .close_loan(loan.id, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::LoanNotActive { .. } => no_active_loan(borrower.id, book.id),
                other => other.into(),
            })
    }

    /// Current loan state of a book
    pub async fn availability(&self, book_id: i64) -> AppResult<BookAvailability> {
        let loan = self.store.find_active_loan_by_book(book_id).await?;
        Ok(availability_of(loan.as_ref()))
    }

    /// Loan state for every book currently out; books absent from the map
    /// are available.
    pub async fn borrowed_books(&self) -> AppResult<HashMap<i64, BookAvailability>> {
        let loans = self.store.list_active_loans().await?;
        Ok(loans
            .iter()
            .map(|loan| (loan.book_id, availability_of(Some(loan))))
            .collect())
    }

    /// Check the ids are present and both parties exist, borrower first
    async fn resolve_parties(
        &self,
        borrower_id: Option<i64>,
        book_id: Option<i64>,
    ) -> AppResult<(Borrower, Book)> {
        let borrower_id = borrower_id
            .ok_or_else(|| AppError::Validation("Borrower ID cannot be null".to_string()))?;
        let book_id =
            book_id.ok_or_else(|| AppError::Validation("Book ID cannot be null".to_string()))?;

        let borrower = self.borrowers.find_borrower(borrower_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Borrower not found with ID: {}", borrower_id))
        })?;
        let book = self
            .catalog
            .find_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book not found with ID: {}", book_id)))?;

        Ok((borrower, book))
    }
}
