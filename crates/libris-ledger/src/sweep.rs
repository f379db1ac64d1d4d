use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use libris_notify::{Notification, NotificationQueue};
use libris_store::{BorrowingFilter, Datastore};
use libris_types::{BorrowingId, Clock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::error::LedgerResult;

/// Outcome of one sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepReport {
    pub date: NaiveDate,
    pub overdue: Vec<BorrowingId>,
}

impl SweepReport {
    pub fn is_clear(&self) -> bool {
        self.overdue.is_empty()
    }
}

/// Finds unreturned loans past their expected return date and tells staff
/// about each one. Read-only: running it twice re-notifies the same set.
#[derive(Clone)]
pub struct OverdueSweep {
    store: Arc<dyn Datastore>,
    notifications: NotificationQueue,
    clock: Arc<dyn Clock>,
}

impl OverdueSweep {
    pub fn new(
        store: Arc<dyn Datastore>,
        notifications: NotificationQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifications, clock }
    }

    pub fn run(&self) -> LedgerResult<SweepReport> {
        let today = self.clock.today();
        let overdue = self.store.borrowings(&BorrowingFilter::overdue_on(today))?;

        if overdue.is_empty() {
            self.notifications.enqueue(Notification::NoOverdue { date: today });
        }

        for loan in &overdue {
            let book_title = match self.store.book(loan.book_id)? {
                Some(book) => book.title,
                None => loan.book_id.to_string(),
            };
            let borrower = match self.store.user(loan.user_id)? {
                Some(user) => user.email,
                None => loan.user_id.to_string(),
            };
            self.notifications.enqueue(Notification::Overdue {
                book_title,
                borrower,
                borrow_date: loan.borrow_date,
                expected_return_date: loan.expected_return_date,
            });
        }

        info!(date = %today, overdue = overdue.len(), "overdue sweep finished");
        Ok(SweepReport { date: today, overdue: overdue.iter().map(|b| b.id).collect() })
    }

    /// Run the sweep every `period` on the current tokio runtime. The first
    /// run happens one full period after the call.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run() {
                    error!(error = %e, "overdue sweep failed");
                }
            }
        })
    }
}

impl std::fmt::Debug for OverdueSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverdueSweep").finish_non_exhaustive()
    }
}
