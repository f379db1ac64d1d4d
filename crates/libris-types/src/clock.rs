use std::fmt;
use std::sync::RwLock;

use chrono::{Days, NaiveDate};

/// Source of the current calendar date.
///
/// Every date-dependent rule (borrow date, return date, overdue detection,
/// fines) reads "today" through this trait so that it can be pinned in tests.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates in the server's local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock that stays on a given date until moved.
pub struct FixedClock {
    date: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date: RwLock::new(date) }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.write().unwrap_or_else(|e| e.into_inner()) = date;
    }

    /// Move the clock forward by `days`. Saturates at the calendar maximum.
    pub fn advance(&self, days: u64) {
        let mut date = self.date.write().unwrap_or_else(|e| e.into_inner());
        *date = date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for FixedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedClock({})", self.today())
    }
}
