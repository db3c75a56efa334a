//! In-process ledger store.
//!
//! All tables sit behind a single async mutex, so each guarded write performs
//! its check and its mutation under one lock acquisition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::{Book, Borrower, LoanRecord, NewBook, NewBorrower, NewLoan};

use super::{LedgerStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    books: Vec<Book>,
    borrowers: Vec<Borrower>,
    loans: Vec<LoanRecord>,
    last_book_id: i64,
    last_borrower_id: i64,
    last_loan_id: i64,
}

impl Tables {
    fn active_loan_for_book(&self, book_id: i64) -> Option<&LoanRecord> {
        self.loans
            .iter()
            .find(|l| l.book_id == book_id && l.is_active())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    tables: Mutex<Tables>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every loan record, active or closed, in creation order
    pub async fn all_loans(&self) -> Vec<LoanRecord> {
        self.tables.lock().await.loans.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_books_by_isbn(&self, isbn: &str) -> StoreResult<Vec<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .books
            .iter()
            .filter(|b| b.isbn == isbn)
            .cloned()
            .collect())
    }

    async fn insert_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables.books.iter().find(|b| b.isbn == book.isbn) {
            if existing.title != book.title || existing.author != book.author {
                tracing::debug!(isbn = %book.isbn, existing_id = existing.id, "ISBN guard rejected insert");
                return Err(StoreError::IsbnConflict {
                    existing: existing.clone(),
                    title: book.title,
                    author: book.author,
                });
            }
        }

        tables.last_book_id += 1;
        let created = Book {
            id: tables.last_book_id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
        };
        tables.books.push(created.clone());
        Ok(created)
    }

    async fn find_book_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables.books.iter().find(|b| b.id == id).cloned())
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.tables.lock().await.books.clone())
    }

    async fn find_borrower_by_email(&self, email: &str) -> StoreResult<Option<Borrower>> {
        let tables = self.tables.lock().await;
        Ok(tables.borrowers.iter().find(|b| b.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.borrowers.iter().any(|b| b.email == email))
    }

    async fn insert_borrower(&self, borrower: NewBorrower) -> StoreResult<Borrower> {
        let mut tables = self.tables.lock().await;

        if tables.borrowers.iter().any(|b| b.email == borrower.email) {
            tracing::debug!(email = %borrower.email, "Email guard rejected insert");
            return Err(StoreError::DuplicateEmail(borrower.email));
        }

        tables.last_borrower_id += 1;
        let created = Borrower {
            id: tables.last_borrower_id,
            name: borrower.name,
            email: borrower.email,
        };
        tables.borrowers.push(created.clone());
        Ok(created)
    }

    async fn find_borrower_by_id(&self, id: i64) -> StoreResult<Option<Borrower>> {
        let tables = self.tables.lock().await;
        Ok(tables.borrowers.iter().find(|b| b.id == id).cloned())
    }

    async fn find_active_loan_by_book(&self, book_id: i64) -> StoreResult<Option<LoanRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.active_loan_for_book(book_id).cloned())
    }

    async fn find_active_loan_by_borrower_and_book(
        &self,
        borrower_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<LoanRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .active_loan_for_book(book_id)
            .filter(|l| l.borrower_id == borrower_id)
            .cloned())
    }

    async fn list_active_loans(&self) -> StoreResult<Vec<LoanRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.loans.iter().filter(|l| l.is_active()).cloned().collect())
    }

    async fn insert_active_loan(&self, loan: NewLoan) -> StoreResult<LoanRecord> {
        let mut tables = self.tables.lock().await;

        if tables.active_loan_for_book(loan.book_id).is_some() {
            tracing::debug!(book_id = loan.book_id, "Active loan guard rejected insert");
            return Err(StoreError::ActiveLoanExists {
                book_id: loan.book_id,
            });
        }

        tables.last_loan_id += 1;
        let created = LoanRecord {
            id: tables.last_loan_id,
            borrower_id: loan.borrower_id,
            book_id: loan.book_id,
            borrowed_at: loan.borrowed_at,
            returned_at: None,
        };
        tables.loans.push(created.clone());
        Ok(created)
    }

    async fn close_loan(&self, loan_id: i64, returned_at: DateTime<Utc>) -> StoreResult<LoanRecord> {
        let mut tables = self.tables.lock().await;

        match tables
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id && l.is_active())
        {
            Some(loan) => {
                loan.returned_at = Some(returned_at);
                Ok(loan.clone())
            }
            None => {
                tracing::debug!(loan_id, "Return guard found loan already closed");
                Err(StoreError::LoanNotActive { loan_id })
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_loan(borrower_id: i64, book_id: i64) -> NewLoan {
        NewLoan {
            borrower_id,
            book_id,
            borrowed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_order() {
        let store = MemoryLedger::new();
        let first = store
            .insert_borrower(NewBorrower {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            })
            .await
            .unwrap();
        let second = store
            .insert_borrower(NewBorrower {
                name: "Grace".into(),
                email: "grace@example.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_active_loan_guard() {
        let store = MemoryLedger::new();
        store.insert_active_loan(new_loan(1, 10)).await.unwrap();

        let err = store.insert_active_loan(new_loan(2, 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::ActiveLoanExists { book_id: 10 }));

        // Another book is unaffected
        store.insert_active_loan(new_loan(2, 11)).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_loan_only_once() {
        let store = MemoryLedger::new();
        let loan = store.insert_active_loan(new_loan(1, 10)).await.unwrap();

        let closed = store.close_loan(loan.id, Utc::now()).await.unwrap();
        assert!(closed.returned_at.is_some());

        let err = store.close_loan(loan.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::LoanNotActive { .. }));

        // The book can go out again once returned
        store.insert_active_loan(new_loan(2, 10)).await.unwrap();
        assert_eq!(store.all_loans().await.len(), 2);
    }

    #[tokio::test]
    async fn test_active_lookup_by_pair_requires_same_borrower() {
        let store = MemoryLedger::new();
        store.insert_active_loan(new_loan(1, 10)).await.unwrap();

        assert!(store
            .find_active_loan_by_borrower_and_book(1, 10)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_active_loan_by_borrower_and_book(2, 10)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_isbn_guard_compares_first_match() {
        let store = MemoryLedger::new();
        let book = |title: &str| NewBook {
            isbn: "9780134685991".into(),
            title: title.into(),
            author: "Joshua Bloch".into(),
        };
        store.insert_book(book("Effective Java")).await.unwrap();
        store.insert_book(book("Effective Java")).await.unwrap();

        let err = store.insert_book(book("Other Title")).await.unwrap_err();
        assert!(matches!(err, StoreError::IsbnConflict { ref existing, .. } if existing.id == 1));
        assert_eq!(store.find_books_by_isbn("9780134685991").await.unwrap().len(), 2);
    }
}
