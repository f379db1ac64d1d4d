//! Domain services for Libris.
//!
//! - [`Catalog`] -- book CRUD, staff-only writes
//! - [`LoanLedger`] -- the borrow/return lifecycle and loan visibility rules
//! - [`OverdueSweep`] -- scheduled detection of unreturned, past-due loans
//!
//! All three are cheap to clone and share an `Arc<dyn Datastore>`. None of
//! them awaits notification delivery; messages go through a
//! [`libris_notify::NotificationQueue`].

pub mod catalog;
pub mod error;
pub mod loans;
pub mod sweep;

pub use catalog::Catalog;
pub use error::{LedgerError, LedgerResult};
pub use loans::{BorrowingQuery, LoanLedger};
pub use sweep::{OverdueSweep, SweepReport};
