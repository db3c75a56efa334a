//! Catalog registry service

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{isbn_mismatch_message, AppError, AppResult},
    models::{Book, NewBook},
    repository::SharedStore,
};

/// ISBN-10 or ISBN-13 once separators are removed
static ISBN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{10}|\d{13})$").expect("ISBN regex is valid"));

/// Strip spaces and hyphens from an ISBN
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// True if the ISBN holds exactly 10 or 13 digits once separators are removed
pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_DIGITS.is_match(&normalize_isbn(isbn))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
}

impl CatalogService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a new book.
    ///
    /// Copies of an already catalogued work are accepted as long as title and
    /// author match the first book registered under the same ISBN.
    pub async fn register_book(&self, isbn: &str, title: &str, author: &str) -> AppResult<Book> {
        if is_blank(title) {
            return Err(AppError::Validation("Book title is required".to_string()));
        }
        if is_blank(author) {
            return Err(AppError::Validation("Book author is required".to_string()));
        }
        if is_blank(isbn) {
            return Err(AppError::Validation("Book ISBN is required".to_string()));
        }
        if !is_valid_isbn(isbn) {
            return Err(AppError::Validation("Invalid ISBN format".to_string()));
        }

        let book = NewBook {
            isbn: isbn.trim().to_string(),
            title: title.to_string(),
            author: author.to_string(),
        };

        let existing = self.store.find_books_by_isbn(&book.isbn).await?;
        if let Some(first) = existing.first() {
            if first.title != book.title || first.author != book.author {
                return Err(AppError::Validation(isbn_mismatch_message(
                    &first.title,
                    &first.author,
                    &book.title,
                    &book.author,
                )));
            }
        }

        // The store re-checks under its own guard; a lost race surfaces as
        // the same validation error.
        Ok(self.store.insert_book(book).await?)
    }

    /// Get all books in registration order
    pub async fn get_all_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.store.list_books().await?)
    }

    /// Get book by ID
    pub async fn get_book_by_id(&self, id: Option<i64>) -> AppResult<Book> {
        let id = id.ok_or_else(|| AppError::Validation("Book ID cannot be null".to_string()))?;
        self.find_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book not found with ID: {}", id)))
    }

    /// Look up a book without treating absence as an error
    pub async fn find_book(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.store.find_book_by_id(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::{MemoryLedger, MockLedgerStore, StoreError};

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryLedger::new()))
    }

    #[test]
    fn test_isbn_shape() {
        assert!(is_valid_isbn("978-0134685991"));
        assert!(is_valid_isbn("978 0 13 468599 1"));
        assert!(is_valid_isbn("0134685997"));
        assert!(!is_valid_isbn("978-013468599"));
        assert!(!is_valid_isbn("97801346859910"));
        assert!(!is_valid_isbn("013468599X"));
        assert!(!is_valid_isbn("abc"));
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-0-13-468599-1"), "9780134685991");
        assert_eq!(normalize_isbn(" 0 13 468599 7 "), "0134685997");
    }

    #[tokio::test]
    async fn test_register_book_assigns_id() {
        let catalog = service();
        let book = catalog
            .register_book("978-0134685991", "Effective Java", "Joshua Bloch")
            .await
            .unwrap();
        assert_eq!(book.id, 1);
        assert_eq!(book.isbn, "978-0134685991");

        let fetched = catalog.get_book_by_id(Some(book.id)).await.unwrap();
        assert_eq!(fetched, book);
    }

    #[tokio::test]
    async fn test_register_book_rejects_blank_and_malformed_input() {
        let catalog = service();
        for (isbn, title, author) in [
            ("978-0134685991", "  ", "Joshua Bloch"),
            ("978-0134685991", "Effective Java", ""),
            (" ", "Effective Java", "Joshua Bloch"),
            ("12345", "Effective Java", "Joshua Bloch"),
        ] {
            let err = catalog.register_book(isbn, title, author).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", (isbn, title, author));
        }
        assert!(catalog.get_all_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_isbn_consistency() {
        let catalog = service();
        catalog
            .register_book("978-0134685991", "Effective Java", "Joshua Bloch")
            .await
            .unwrap();

        let err = catalog
            .register_book("978-0134685991", "Other Title", "Joshua Bloch")
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("Existing: Effective Java by Joshua Bloch"));
                assert!(msg.contains("New: Other Title by Joshua Bloch"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // A second copy of the same work is fine
        let copy = catalog
            .register_book("978-0134685991", "Effective Java", "Joshua Bloch")
            .await
            .unwrap();
        assert_eq!(copy.id, 2);
        assert_eq!(catalog.get_all_books().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_book_by_id_distinguishes_missing_input_from_unknown_id() {
        let catalog = service();
        assert!(matches!(
            catalog.get_book_by_id(None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            catalog.get_book_by_id(Some(42)).await,
            Err(AppError::NotFound(ref m)) if m == "Book not found with ID: 42"
        ));
    }

    #[tokio::test]
    async fn test_get_all_books_keeps_insertion_order() {
        let catalog = service();
        catalog.register_book("0134685997", "A", "X").await.unwrap();
        catalog.register_book("9781593278281", "B", "Y").await.unwrap();
        catalog.register_book("0134685997", "A", "X").await.unwrap();

        let ids: Vec<i64> = catalog
            .get_all_books()
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_store_guard_rejection_reads_as_validation() {
        let mut store = MockLedgerStore::new();
        store.expect_find_books_by_isbn().returning(|_| Ok(vec![]));
        store.expect_insert_book().returning(|book| {
            Err(StoreError::IsbnConflict {
                existing: Book {
                    id: 9,
                    isbn: book.isbn.clone(),
                    title: "Effective Java".to_string(),
                    author: "Joshua Bloch".to_string(),
                },
                title: book.title,
                author: book.author,
            })
        });

        let catalog = CatalogService::new(Arc::new(store));
        let err = catalog
            .register_book("978-0134685991", "Other Title", "Joshua Bloch")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Existing: Effective Java")));
    }

    #[tokio::test]
    async fn test_store_failure_passes_through() {
        let mut store = MockLedgerStore::new();
        store
            .expect_list_books()
            .returning(|| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let catalog = CatalogService::new(Arc::new(store));
        let err = catalog.get_all_books().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_agree_on_title() {
        let catalog = service();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let catalog = catalog.clone();
                tokio::spawn(async move {
                    catalog
                        .register_book("9780134685991", &format!("Title {}", i % 2), "A")
                        .await
                })
            })
            .collect();

        for task in tasks {
            match task.await.unwrap() {
                Ok(_) | Err(AppError::Validation(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        let books = catalog.get_all_books().await.unwrap();
        assert_eq!(books.len(), 4);
        assert!(books.iter().all(|b| b.title == books[0].title));
    }
}
