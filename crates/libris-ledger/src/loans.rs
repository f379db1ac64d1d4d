use std::sync::Arc;

use chrono::NaiveDate;
use libris_notify::{Notification, NotificationQueue};
use libris_store::{BorrowingFilter, Datastore};
use libris_types::{BookId, Borrowing, BorrowingId, Clock, User, UserId};
use tracing::info;

use crate::error::{LedgerError, LedgerResult};

/// Caller-supplied listing criteria. Narrowed by the caller's privileges
/// before it reaches the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorrowingQuery {
    /// Honored for staff only.
    pub owner: Option<UserId>,
    /// `Some(true)`: unreturned loans. `Some(false)`: returned loans.
    pub active: Option<bool>,
}

/// The borrowing lifecycle: lend a copy, take it back, and answer who holds
/// what.
///
/// Every inventory change happens inside a single datastore call, so a
/// failed borrow or return never leaves the catalog and the loan table out
/// of step.
#[derive(Clone)]
pub struct LoanLedger {
    store: Arc<dyn Datastore>,
    notifications: NotificationQueue,
    clock: Arc<dyn Clock>,
}

impl LoanLedger {
    pub fn new(
        store: Arc<dyn Datastore>,
        notifications: NotificationQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifications, clock }
    }

    /// Lend one copy of `book_id` to `requester`, due back on
    /// `expected_return_date`.
    pub fn create_borrowing(
        &self,
        requester: &User,
        book_id: BookId,
        expected_return_date: NaiveDate,
    ) -> LedgerResult<Borrowing> {
        let today = self.clock.today();
        let draft = Borrowing::open(book_id, requester.id, today, expected_return_date)?;
        let (borrowing, book) = self.store.open_borrowing(draft)?;

        info!(
            borrowing_id = %borrowing.id,
            book_id = %book.id,
            user_id = %requester.id,
            inventory = book.inventory,
            "book borrowed"
        );
        self.notifications.enqueue(Notification::NewBorrowing {
            book_title: book.title,
            borrower: requester.email.clone(),
            borrow_date: borrowing.borrow_date,
            expected_return_date: borrowing.expected_return_date,
        });
        Ok(borrowing)
    }

    /// Record the return of a loan today and put the copy back on the shelf.
    pub fn return_borrowing(&self, requester: &User, id: BorrowingId) -> LedgerResult<Borrowing> {
        self.get_borrowing(requester, id)?;
        let (borrowing, book) = self.store.close_borrowing(id, self.clock.today())?;
        info!(
            borrowing_id = %id,
            book_id = %book.id,
            inventory = book.inventory,
            "book returned"
        );
        Ok(borrowing)
    }

    /// A single loan. Loans owned by someone else are reported as missing
    /// to non-staff callers.
    pub fn get_borrowing(&self, requester: &User, id: BorrowingId) -> LedgerResult<Borrowing> {
        match self.store.borrowing(id)? {
            Some(b) if requester.can_access(b.user_id) => Ok(b),
            _ => Err(LedgerError::BorrowingNotFound(id)),
        }
    }

    pub fn list_borrowings(
        &self,
        requester: &User,
        query: &BorrowingQuery,
    ) -> LedgerResult<Vec<Borrowing>> {
        let owner = if requester.is_staff { query.owner } else { Some(requester.id) };
        let filter = BorrowingFilter { user_id: owner, ..BorrowingFilter::default() }
            .with_active(query.active);
        Ok(self.store.borrowings(&filter)?)
    }
}

impl std::fmt::Debug for LoanLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanLedger").finish_non_exhaustive()
    }
}
