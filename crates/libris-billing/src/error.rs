use libris_store::StoreError;
use libris_types::{BookId, BorrowingId};
use thiserror::Error;

/// Failures reported by a payment-session provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error of its own.
    #[error("payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected payment provider response: {0}")]
    Malformed(String),

    #[error("unknown checkout session: {0}")]
    UnknownSession(String),

    /// Used by test doubles to simulate an outage.
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),

    #[error("payment provider configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum BillingError {
    /// Also returned for loans the caller is not allowed to see.
    #[error("borrowing not found: {0}")]
    BorrowingNotFound(BorrowingId),

    #[error("book not found: {0}")]
    BookNotFound(BookId),

    #[error("no payment for session {0}")]
    SessionNotFound(String),

    #[error("borrowing {0} is not overdue; no fine is due")]
    NoFineDue(BorrowingId),

    /// The session's reference does not point at the loan its payment
    /// was opened for.
    #[error("session {session_id} references {reference:?}, not its borrowing")]
    ReferenceMismatch { session_id: String, reference: Option<String> },

    #[error("amount {0} cannot be charged")]
    InvalidAmount(rust_decimal::Decimal),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BorrowingNotFound(id) => Self::BorrowingNotFound(id),
            StoreError::BookNotFound(id) => Self::BookNotFound(id),
            StoreError::SessionNotFound(id) => Self::SessionNotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
