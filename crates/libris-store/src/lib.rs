//! Datastore boundary for Libris.
//!
//! The rest of the system treats durable storage as a black box reached
//! through the traits in [`traits`]. The contract those traits promise is the
//! one a relational database would give us:
//!
//! 1. Reads only ever observe committed rows.
//! 2. Opening and closing a borrowing adjusts the book's inventory in the same
//!    unit of work as the borrowing row itself; on failure neither changes.
//! 3. Inventory checks run under a lock scoped to the single book row, so two
//!    borrows of the last copy cannot both succeed while borrows of different
//!    books never contend.
//! 4. A payment moves from pending to paid at most once.
//!
//! # Storage Backends
//!
//! - [`InMemoryStore`] -- `HashMap` tables behind `RwLock`s with a `Mutex` per
//!   book row, for tests, local demos, and embedding

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::{
    BookStore, BorrowingFilter, BorrowingStore, Datastore, PaymentFilter, PaymentStore,
    Settlement, UserStore,
};
