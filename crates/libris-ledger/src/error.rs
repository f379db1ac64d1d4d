use libris_store::StoreError;
use libris_types::{BookId, BorrowingId, TypeError, UserId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    /// Also returned for loans the caller is not allowed to see.
    #[error("borrowing not found: {0}")]
    BorrowingNotFound(BorrowingId),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("book {book} has no copies available for borrowing")]
    InventoryExhausted { book: BookId },

    #[error("borrowing {borrowing} has already been returned")]
    AlreadyReturned { borrowing: BorrowingId },

    #[error("book {book} has {outstanding} unreturned borrowing(s)")]
    BookOnLoan { book: BookId, outstanding: usize },

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Rejected input: bad book fields or an impossible return date.
    #[error(transparent)]
    Invalid(TypeError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_) | Self::BorrowingNotFound(_) | Self::UserNotFound(_)
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookNotFound(id) => Self::BookNotFound(id),
            StoreError::BorrowingNotFound(id) => Self::BorrowingNotFound(id),
            StoreError::UserNotFound(id) => Self::UserNotFound(id),
            StoreError::InventoryExhausted { book } => Self::InventoryExhausted { book },
            StoreError::AlreadyReturned { borrowing } => Self::AlreadyReturned { borrowing },
            StoreError::BookOnLoan { book, outstanding } => Self::BookOnLoan { book, outstanding },
            StoreError::Invalid(e) => Self::Invalid(e),
            other => Self::Store(other),
        }
    }
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        Self::Invalid(err)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_store_errors_keep_their_meaning() {
        let book = BookId::new();
        assert_eq!(
            LedgerError::from(StoreError::InventoryExhausted { book }),
            LedgerError::InventoryExhausted { book }
        );
        assert!(LedgerError::from(StoreError::BookNotFound(book)).is_not_found());
        assert_eq!(
            LedgerError::from(StoreError::Poisoned("books")),
            LedgerError::Store(StoreError::Poisoned("books"))
        );
    }
}
