use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{BookId, BorrowingId, UserId};

/// One book lent to one user for a bounded period.
///
/// `borrow_date` and `expected_return_date` are fixed at creation.
/// `actual_return_date` is set exactly once, by the return transition, and
/// never cleared afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: BorrowingId,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub book_id: BookId,
    pub user_id: UserId,
}

impl Borrowing {
    /// Open a new, unreturned loan dated `borrow_date`.
    pub fn open(
        book_id: BookId,
        user_id: UserId,
        borrow_date: NaiveDate,
        expected_return_date: NaiveDate,
    ) -> Result<Self, TypeError> {
        if expected_return_date < borrow_date {
            return Err(TypeError::InvalidReturnDate {
                borrowed: borrow_date,
                expected: expected_return_date,
            });
        }
        Ok(Self {
            id: BorrowingId::new(),
            borrow_date,
            expected_return_date,
            actual_return_date: None,
            book_id,
            user_id,
        })
    }

    /// A loan is active until the book has been handed back.
    ///
    /// This is the only notion of "active" in Libris: listing filters, the
    /// overdue sweep and the read views all use it.
    pub fn is_active(&self) -> bool {
        self.actual_return_date.is_none()
    }

    /// Active and past its expected return date as of `today`.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.is_active() && self.expected_return_date < today
    }

    /// Days the book is charged for: up to the return if it happened,
    /// otherwise up to the expected return date. Never less than one.
    pub fn billable_days(&self) -> i64 {
        let end = self.actual_return_date.unwrap_or(self.expected_return_date);
        (end - self.borrow_date).num_days().max(1)
    }

    /// Days past the expected return date, counted up to the actual return
    /// or to `today` while the book is still out. Zero when on time.
    pub fn overdue_days(&self, today: NaiveDate) -> i64 {
        let end = self.actual_return_date.unwrap_or(today);
        (end - self.expected_return_date).num_days().max(0)
    }
}
