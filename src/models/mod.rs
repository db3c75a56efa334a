//! Data models for the lending server

pub mod book;
pub mod borrower;
pub mod loan;

// Re-export commonly used types
pub use book::{Book, BookAvailability, NewBook};
pub use borrower::{Borrower, NewBorrower};
pub use loan::{LoanRecord, NewLoan};
