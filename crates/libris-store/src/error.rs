use libris_types::{BookId, BorrowingId, TypeError, UserId};

/// Errors from datastore operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    #[error("borrowing not found: {0}")]
    BorrowingNotFound(BorrowingId),

    #[error("no payment for session {0}")]
    SessionNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No copy of the book is left to lend.
    #[error("book {book} has no copies available for borrowing")]
    InventoryExhausted { book: BookId },

    /// The borrowing already carries an actual return date.
    #[error("borrowing {borrowing} has already been returned")]
    AlreadyReturned { borrowing: BorrowingId },

    /// The book still has loans that have not been returned.
    #[error("book {book} has {outstanding} unreturned borrowing(s)")]
    BookOnLoan { book: BookId, outstanding: usize },

    #[error("inventory of book {0} would overflow")]
    InventoryOverflow(BookId),

    #[error("a payment for session {0} already exists")]
    DuplicateSession(String),

    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),

    #[error(transparent)]
    Invalid(#[from] TypeError),

    /// A lock was poisoned by a panicking writer.
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
