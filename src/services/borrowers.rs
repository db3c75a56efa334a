//! Borrower registry service

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{Borrower, NewBorrower},
    repository::SharedStore,
};

/// local-part "@" domain with a dotted alphabetic TLD
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})$").expect("email regex is valid")
});

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

#[derive(Clone)]
pub struct BorrowerService {
    store: SharedStore,
}

impl BorrowerService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a new borrower with a unique email
    pub async fn register_borrower(&self, name: &str, email: &str) -> AppResult<Borrower> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Borrower name is required".to_string()));
        }
        let name_len = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_len) {
            return Err(AppError::Validation(format!(
                "Borrower name must be between {} and {} characters",
                NAME_MIN_CHARS, NAME_MAX_CHARS
            )));
        }
        if email.trim().is_empty() {
            return Err(AppError::Validation("Borrower email is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        if self.store.email_exists(email).await? {
            return Err(AppError::Validation(format!("Email already exists: {}", email)));
        }

        // Concurrent registrations of the same email are settled by the
        // store's uniqueness guard, reported with the message above.
        let borrower = NewBorrower {
            name: name.to_string(),
            email: email.to_string(),
        };
        Ok(self.store.insert_borrower(borrower).await?)
    }

    /// Get borrower by ID
    pub async fn get_borrower_by_id(&self, id: Option<i64>) -> AppResult<Borrower> {
        let id = id.ok_or_else(|| AppError::Validation("Borrower ID cannot be null".to_string()))?;
        self.find_borrower(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower not found with ID: {}", id)))
    }

    /// Look up a borrower without treating absence as an error
    pub async fn find_borrower(&self, id: i64) -> AppResult<Option<Borrower>> {
        Ok(self.store.find_borrower_by_id(id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Borrower>> {
        Ok(self.store.find_borrower_by_email(email).await?)
    }
}
