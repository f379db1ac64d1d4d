//! Foundation types for Libris, the library-rental backend.
//!
//! This crate provides the records and identifiers shared by every other
//! Libris crate. It has no knowledge of storage, transport, or scheduling.
//!
//! # Key Types
//!
//! - [`Book`] / [`BookDraft`]: Catalog records and their validated write form
//! - [`Borrowing`]: A single loan of one book to one user
//! - [`Payment`]: A checkout session opened against a borrowing
//! - [`User`]: An authenticated borrower or staff member
//! - [`BookId`], [`BorrowingId`], [`PaymentId`], [`UserId`]: UUID v7 identifiers
//! - [`Clock`]: Source of "today" for every date-dependent rule

pub mod book;
pub mod borrowing;
pub mod clock;
pub mod error;
pub mod id;
pub mod payment;
pub mod user;

pub use book::{Book, BookDraft, Cover, MAX_TEXT_LEN};
pub use borrowing::Borrowing;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TypeError;
pub use id::{BookId, BorrowingId, PaymentId, UserId};
pub use payment::{Payment, PaymentKind, PaymentStatus};
pub use user::User;
