use chrono::NaiveDate;
use libris_types::{
    Book, BookDraft, BookId, Borrowing, BorrowingId, Payment, User, UserId,
};

use crate::error::StoreResult;

/// Selection criteria for [`BorrowingStore::borrowings`]. Unset fields match
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorrowingFilter {
    /// Only loans held by this user.
    pub user_id: Option<UserId>,
    /// `true`: not yet returned. `false`: returned.
    pub active: Option<bool>,
    /// Only loans that are unreturned and past due as of this date.
    pub overdue_on: Option<NaiveDate>,
}

impl BorrowingFilter {
    pub fn owned_by(user_id: UserId) -> Self {
        Self { user_id: Some(user_id), ..Self::default() }
    }

    pub fn overdue_on(today: NaiveDate) -> Self {
        Self { overdue_on: Some(today), ..Self::default() }
    }

    pub fn with_active(mut self, active: Option<bool>) -> Self {
        self.active = active;
        self
    }

    pub fn matches(&self, borrowing: &Borrowing) -> bool {
        if let Some(user_id) = self.user_id {
            if borrowing.user_id != user_id {
                return false;
            }
        }
        if let Some(active) = self.active {
            if borrowing.is_active() != active {
                return false;
            }
        }
        if let Some(today) = self.overdue_on {
            if !borrowing.is_overdue_on(today) {
                return false;
            }
        }
        true
    }
}

/// Selection criteria for [`PaymentStore::payments`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    /// Only payments on borrowings held by this user.
    pub user_id: Option<UserId>,
    pub borrowing_id: Option<BorrowingId>,
}

/// Result of settling a payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The payment moved from pending to paid by this call.
    Applied(Payment),
    /// The payment was already paid; nothing changed.
    AlreadyPaid(Payment),
}

impl Settlement {
    pub fn payment(&self) -> &Payment {
        match self {
            Self::Applied(p) | Self::AlreadyPaid(p) => p,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Catalog table.
pub trait BookStore: Send + Sync {
    /// Insert a validated book.
    fn insert_book(&self, book: Book) -> StoreResult<Book>;

    /// Read a book by ID. Returns `Ok(None)` if it does not exist.
    fn book(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// All books, ordered by title then ID.
    fn books(&self) -> StoreResult<Vec<Book>>;

    /// Replace a book's editable fields under its row lock.
    fn update_book(&self, id: BookId, draft: BookDraft) -> StoreResult<Book>;

    /// Delete a book together with its returned borrowings and their
    /// payments. Fails with `BookOnLoan` while any borrowing is unreturned.
    ///
    /// Returns `true` if the book existed.
    fn delete_book(&self, id: BookId) -> StoreResult<bool>;
}

/// Loan table and the inventory transitions tied to it.
pub trait BorrowingStore: Send + Sync {
    /// Insert an open borrowing and take one copy of its book, as one unit.
    ///
    /// Fails with `InventoryExhausted` if no copy is left; in that case
    /// neither the book nor the loan table changes. Returns the stored
    /// borrowing and the book as it is after the decrement.
    fn open_borrowing(&self, borrowing: Borrowing) -> StoreResult<(Borrowing, Book)>;

    /// Record the return of a borrowing and put its copy back, as one unit.
    ///
    /// Fails with `AlreadyReturned` if a return date is already recorded.
    fn close_borrowing(
        &self,
        id: BorrowingId,
        returned_on: NaiveDate,
    ) -> StoreResult<(Borrowing, Book)>;

    fn borrowing(&self, id: BorrowingId) -> StoreResult<Option<Borrowing>>;

    /// Borrowings matching `filter`, oldest borrow date first.
    fn borrowings(&self, filter: &BorrowingFilter) -> StoreResult<Vec<Borrowing>>;
}

/// Payment table.
pub trait PaymentStore: Send + Sync {
    /// Insert a payment. Its borrowing must exist and its session ID must be
    /// unused.
    fn insert_payment(&self, payment: Payment) -> StoreResult<Payment>;

    fn payment_by_session(&self, session_id: &str) -> StoreResult<Option<Payment>>;

    fn payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>>;

    /// Mark the payment for `session_id` as paid.
    ///
    /// Idempotent: a payment that is already paid is returned unchanged as
    /// [`Settlement::AlreadyPaid`].
    fn settle_payment(&self, session_id: &str) -> StoreResult<Settlement>;
}

/// Accounts provisioned for the identity provider.
pub trait UserStore: Send + Sync {
    /// Insert a user. Emails are unique, compared case-insensitively.
    fn insert_user(&self, user: User) -> StoreResult<User>;

    fn user(&self, id: UserId) -> StoreResult<Option<User>>;
}

/// The full datastore contract consumed by the services.
pub trait Datastore: BookStore + BorrowingStore + PaymentStore + UserStore {}

impl<T> Datastore for T where T: BookStore + BorrowingStore + PaymentStore + UserStore {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn default_filter_matches_everything() {
        let b = Borrowing::open(BookId::new(), UserId::new(), day(1), day(3)).unwrap();
        assert!(BorrowingFilter::default().matches(&b));
    }

    #[test]
    fn active_filter_uses_return_date() {
        let mut b = Borrowing::open(BookId::new(), UserId::new(), day(1), day(3)).unwrap();
        let active = BorrowingFilter::default().with_active(Some(true));
        let returned = BorrowingFilter::default().with_active(Some(false));
        assert!(active.matches(&b));
        assert!(!returned.matches(&b));

        b.actual_return_date = Some(day(2));
        assert!(!active.matches(&b));
        assert!(returned.matches(&b));
    }

    #[test]
    fn owner_and_overdue_filters() {
        let owner = UserId::new();
        let b = Borrowing::open(BookId::new(), owner, day(1), day(3)).unwrap();
        assert!(BorrowingFilter::owned_by(owner).matches(&b));
        assert!(!BorrowingFilter::owned_by(UserId::new()).matches(&b));
        assert!(!BorrowingFilter::overdue_on(day(3)).matches(&b));
        assert!(BorrowingFilter::overdue_on(day(4)).matches(&b));
    }
}
