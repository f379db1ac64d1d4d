use thiserror::Error;

/// Errors produced while constructing or validating domain types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid book: {0}")]
    InvalidBook(String),

    #[error("expected return date {expected} is before borrow date {borrowed}")]
    InvalidReturnDate {
        borrowed: chrono::NaiveDate,
        expected: chrono::NaiveDate,
    },
}
