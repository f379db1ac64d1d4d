use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use libris_types::{
    Book, BookDraft, BookId, Borrowing, BorrowingId, Payment, PaymentId, PaymentStatus, User,
    UserId,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    BookStore, BorrowingFilter, BorrowingStore, PaymentFilter, PaymentStore, Settlement,
    UserStore,
};

/// A book plus a tombstone so that callers holding a stale row handle see
/// the deletion once they acquire the row lock.
struct BookRow {
    book: Book,
    deleted: bool,
}

/// In-memory datastore.
///
/// Each table is a `HashMap` behind a `RwLock`. Book rows additionally sit
/// behind their own `Mutex`, which plays the part of a row-level lock: every
/// inventory check-and-modify holds it for the duration of the unit of work.
///
/// Lock order is row, then borrowings, then payments. The books map lock is
/// never held while waiting on a row.
pub struct InMemoryStore {
    books: RwLock<HashMap<BookId, Arc<Mutex<BookRow>>>>,
    borrowings: RwLock<HashMap<BorrowingId, Borrowing>>,
    payments: RwLock<HashMap<PaymentId, Payment>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            borrowings: RwLock::new(HashMap::new()),
            payments: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of borrowings on record, returned or not.
    pub fn borrowing_count(&self) -> StoreResult<usize> {
        Ok(read(&self.borrowings, "borrowings")?.len())
    }

    /// Number of payments on record.
    pub fn payment_count(&self) -> StoreResult<usize> {
        Ok(read(&self.payments, "payments")?.len())
    }

    fn row(&self, id: BookId) -> StoreResult<Arc<Mutex<BookRow>>> {
        read(&self.books, "books")?
            .get(&id)
            .cloned()
            .ok_or(StoreError::BookNotFound(id))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let books = self.books.read().map(|m| m.len()).unwrap_or_default();
        let borrowings = self.borrowings.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryStore")
            .field("books", &books)
            .field("borrowings", &borrowings)
            .finish()
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, table: &'static str) -> StoreResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| StoreError::Poisoned(table))
}

fn write<'a, T>(lock: &'a RwLock<T>, table: &'static str) -> StoreResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| StoreError::Poisoned(table))
}

fn lock_row(row: &Mutex<BookRow>) -> StoreResult<MutexGuard<'_, BookRow>> {
    row.lock().map_err(|_| StoreError::Poisoned("book row"))
}

impl BookStore for InMemoryStore {
    fn insert_book(&self, book: Book) -> StoreResult<Book> {
        let row = BookRow { book: book.clone(), deleted: false };
        write(&self.books, "books")?.insert(book.id, Arc::new(Mutex::new(row)));
        Ok(book)
    }

    fn book(&self, id: BookId) -> StoreResult<Option<Book>> {
        let Some(row) = read(&self.books, "books")?.get(&id).cloned() else {
            return Ok(None);
        };
        let row = lock_row(&row)?;
        Ok((!row.deleted).then(|| row.book.clone()))
    }

    fn books(&self) -> StoreResult<Vec<Book>> {
        let rows: Vec<_> = read(&self.books, "books")?.values().cloned().collect();
        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            let row = lock_row(&row)?;
            if !row.deleted {
                books.push(row.book.clone());
            }
        }
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    fn update_book(&self, id: BookId, draft: BookDraft) -> StoreResult<Book> {
        let row = self.row(id)?;
        let mut row = lock_row(&row)?;
        if row.deleted {
            return Err(StoreError::BookNotFound(id));
        }
        row.book.apply(draft)?;
        Ok(row.book.clone())
    }

    fn delete_book(&self, id: BookId) -> StoreResult<bool> {
        let Some(row) = read(&self.books, "books")?.get(&id).cloned() else {
            return Ok(false);
        };
        let mut row = lock_row(&row)?;
        if row.deleted {
            return Ok(false);
        }

        let mut borrowings = write(&self.borrowings, "borrowings")?;
        let outstanding = borrowings
            .values()
            .filter(|b| b.book_id == id && b.is_active())
            .count();
        if outstanding > 0 {
            return Err(StoreError::BookOnLoan { book: id, outstanding });
        }

        let mut payments = write(&self.payments, "payments")?;
        let loans: HashSet<BorrowingId> = borrowings
            .values()
            .filter(|b| b.book_id == id)
            .map(|b| b.id)
            .collect();
        payments.retain(|_, p| !loans.contains(&p.borrowing_id));
        borrowings.retain(|_, b| b.book_id != id);
        row.deleted = true;
        drop(payments);
        drop(borrowings);

        write(&self.books, "books")?.remove(&id);
        debug!(book_id = %id, cascaded = loans.len(), "book deleted");
        Ok(true)
    }
}

impl BorrowingStore for InMemoryStore {
    fn open_borrowing(&self, borrowing: Borrowing) -> StoreResult<(Borrowing, Book)> {
        if self.user(borrowing.user_id)?.is_none() {
            return Err(StoreError::UserNotFound(borrowing.user_id));
        }

        let row = self.row(borrowing.book_id)?;
        let mut row = lock_row(&row)?;
        if row.deleted {
            return Err(StoreError::BookNotFound(borrowing.book_id));
        }

        let remaining = row
            .book
            .inventory
            .checked_sub(1)
            .ok_or(StoreError::InventoryExhausted { book: borrowing.book_id })?;

        write(&self.borrowings, "borrowings")?.insert(borrowing.id, borrowing.clone());
        row.book.inventory = remaining;

        debug!(
            borrowing_id = %borrowing.id,
            book_id = %borrowing.book_id,
            inventory = remaining,
            "borrowing opened"
        );
        Ok((borrowing, row.book.clone()))
    }

    fn close_borrowing(
        &self,
        id: BorrowingId,
        returned_on: NaiveDate,
    ) -> StoreResult<(Borrowing, Book)> {
        let book_id = read(&self.borrowings, "borrowings")?
            .get(&id)
            .map(|b| b.book_id)
            .ok_or(StoreError::BorrowingNotFound(id))?;

        let row = self.row(book_id)?;
        let mut row = lock_row(&row)?;
        if row.deleted {
            return Err(StoreError::BookNotFound(book_id));
        }

        let mut borrowings = write(&self.borrowings, "borrowings")?;
        let borrowing = borrowings
            .get_mut(&id)
            .ok_or(StoreError::BorrowingNotFound(id))?;
        if borrowing.actual_return_date.is_some() {
            return Err(StoreError::AlreadyReturned { borrowing: id });
        }
        let restored = row
            .book
            .inventory
            .checked_add(1)
            .ok_or(StoreError::InventoryOverflow(book_id))?;

        borrowing.actual_return_date = Some(returned_on);
        row.book.inventory = restored;

        debug!(borrowing_id = %id, book_id = %book_id, inventory = restored, "borrowing closed");
        Ok((borrowing.clone(), row.book.clone()))
    }

    fn borrowing(&self, id: BorrowingId) -> StoreResult<Option<Borrowing>> {
        Ok(read(&self.borrowings, "borrowings")?.get(&id).cloned())
    }

    fn borrowings(&self, filter: &BorrowingFilter) -> StoreResult<Vec<Borrowing>> {
        let mut found: Vec<Borrowing> = read(&self.borrowings, "borrowings")?
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.borrow_date.cmp(&b.borrow_date).then(a.id.cmp(&b.id)));
        Ok(found)
    }
}

impl PaymentStore for InMemoryStore {
    fn insert_payment(&self, payment: Payment) -> StoreResult<Payment> {
        let borrowings = read(&self.borrowings, "borrowings")?;
        if !borrowings.contains_key(&payment.borrowing_id) {
            return Err(StoreError::BorrowingNotFound(payment.borrowing_id));
        }

        let mut payments = write(&self.payments, "payments")?;
        if payments.values().any(|p| p.session_id == payment.session_id) {
            return Err(StoreError::DuplicateSession(payment.session_id));
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn payment_by_session(&self, session_id: &str) -> StoreResult<Option<Payment>> {
        Ok(read(&self.payments, "payments")?
            .values()
            .find(|p| p.session_id == session_id)
            .cloned())
    }

    fn payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let owned: Option<HashSet<BorrowingId>> = match filter.user_id {
            Some(user_id) => Some(
                read(&self.borrowings, "borrowings")?
                    .values()
                    .filter(|b| b.user_id == user_id)
                    .map(|b| b.id)
                    .collect(),
            ),
            None => None,
        };

        let mut found: Vec<Payment> = read(&self.payments, "payments")?
            .values()
            .filter(|p| filter.borrowing_id.map_or(true, |id| p.borrowing_id == id))
            .filter(|p| owned.as_ref().map_or(true, |ids| ids.contains(&p.borrowing_id)))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }

    fn settle_payment(&self, session_id: &str) -> StoreResult<Settlement> {
        let mut payments = write(&self.payments, "payments")?;
        let payment = payments
            .values_mut()
            .find(|p| p.session_id == session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        if payment.is_paid() {
            return Ok(Settlement::AlreadyPaid(payment.clone()));
        }
        payment.status = PaymentStatus::Paid;
        debug!(payment_id = %payment.id, session_id, "payment settled");
        Ok(Settlement::Applied(payment.clone()))
    }
}

impl UserStore for InMemoryStore {
    fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = write(&self.users, "users")?;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(read(&self.users, "users")?.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_types::PaymentKind;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::sync::Barrier;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn store_with_book(inventory: u32) -> (InMemoryStore, Book, User) {
        let store = InMemoryStore::new();
        let book = Book::from_draft(BookDraft::new(
            "Test Book",
            "Author",
            inventory,
            Decimal::new(250, 2),
        ))
        .unwrap();
        let book = store.insert_book(book).unwrap();
        let user = store.insert_user(User::member("reader@example.com")).unwrap();
        (store, book, user)
    }

    fn loan(book: &Book, user: &User) -> Borrowing {
        Borrowing::open(book.id, user.id, day(1), day(8)).unwrap()
    }

    fn inventory(store: &InMemoryStore, id: BookId) -> u32 {
        store.book(id).unwrap().unwrap().inventory
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_read_book() {
        let (store, book, _) = store_with_book(3);
        assert_eq!(store.book(book.id).unwrap(), Some(book.clone()));
        assert_eq!(store.books().unwrap(), vec![book]);
        assert_eq!(store.book(BookId::new()).unwrap(), None);
    }

    #[test]
    fn books_are_sorted_by_title() {
        let store = InMemoryStore::new();
        for title in ["Zorba", "Anna Karenina", "Moby Dick"] {
            let book = Book::from_draft(BookDraft::new(title, "A", 1, Decimal::ONE)).unwrap();
            store.insert_book(book).unwrap();
        }
        let titles: Vec<_> = store.books().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, ["Anna Karenina", "Moby Dick", "Zorba"]);
    }

    #[test]
    fn update_book_validates() {
        let (store, book, _) = store_with_book(3);
        let updated = store
            .update_book(book.id, BookDraft::new("New", "Writer", 7, Decimal::ONE))
            .unwrap();
        assert_eq!(updated.inventory, 7);

        let err = store
            .update_book(book.id, BookDraft::new("", "Writer", 7, Decimal::ONE))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(store.book(book.id).unwrap().unwrap().title, "New");
    }

    #[test]
    fn delete_refuses_while_on_loan() {
        let (store, book, user) = store_with_book(2);
        let (b, _) = store.open_borrowing(loan(&book, &user)).unwrap();

        let err = store.delete_book(book.id).unwrap_err();
        assert_eq!(err, StoreError::BookOnLoan { book: book.id, outstanding: 1 });

        store.close_borrowing(b.id, day(2)).unwrap();
        assert!(store.delete_book(book.id).unwrap());
        assert_eq!(store.book(book.id).unwrap(), None);
        assert!(!store.delete_book(book.id).unwrap());
    }

    #[test]
    fn delete_cascades_returned_loans_and_payments() {
        let (store, book, user) = store_with_book(1);
        let (b, _) = store.open_borrowing(loan(&book, &user)).unwrap();
        store.close_borrowing(b.id, day(2)).unwrap();
        store
            .insert_payment(Payment::pending(
                PaymentKind::Payment,
                b.id,
                "cs_1",
                "https://pay/cs_1",
                Decimal::ONE,
            ))
            .unwrap();

        store.delete_book(book.id).unwrap();
        assert_eq!(store.borrowing_count().unwrap(), 0);
        assert_eq!(store.payment_count().unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Borrowing transitions
    // -----------------------------------------------------------------------

    #[test]
    fn open_borrowing_takes_a_copy() {
        let (store, book, user) = store_with_book(2);
        let (b, after) = store.open_borrowing(loan(&book, &user)).unwrap();
        assert_eq!(after.inventory, 1);
        assert_eq!(inventory(&store, book.id), 1);
        assert_eq!(store.borrowing(b.id).unwrap(), Some(b));
    }

    #[test]
    fn exhausted_inventory_changes_nothing() {
        let (store, book, user) = store_with_book(0);
        let err = store.open_borrowing(loan(&book, &user)).unwrap_err();
        assert_eq!(err, StoreError::InventoryExhausted { book: book.id });
        assert_eq!(inventory(&store, book.id), 0);
        assert_eq!(store.borrowing_count().unwrap(), 0);
    }

    #[test]
    fn open_borrowing_requires_known_book_and_user() {
        let (store, book, user) = store_with_book(1);
        let orphan = Borrowing::open(BookId::new(), user.id, day(1), day(2)).unwrap();
        assert!(matches!(
            store.open_borrowing(orphan),
            Err(StoreError::BookNotFound(_))
        ));

        let stranger = Borrowing::open(book.id, UserId::new(), day(1), day(2)).unwrap();
        assert!(matches!(
            store.open_borrowing(stranger),
            Err(StoreError::UserNotFound(_))
        ));
        assert_eq!(inventory(&store, book.id), 1);
    }

    #[test]
    fn borrow_then_return_restores_inventory() {
        let (store, book, user) = store_with_book(4);
        let (b, _) = store.open_borrowing(loan(&book, &user)).unwrap();
        let (returned, after) = store.close_borrowing(b.id, day(3)).unwrap();
        assert_eq!(returned.actual_return_date, Some(day(3)));
        assert_eq!(after.inventory, 4);
    }

    #[test]
    fn second_return_is_rejected_without_increment() {
        let (store, book, user) = store_with_book(1);
        let (b, _) = store.open_borrowing(loan(&book, &user)).unwrap();
        store.close_borrowing(b.id, day(3)).unwrap();

        let err = store.close_borrowing(b.id, day(4)).unwrap_err();
        assert_eq!(err, StoreError::AlreadyReturned { borrowing: b.id });
        assert_eq!(inventory(&store, book.id), 1);
        let stored = store.borrowing(b.id).unwrap().unwrap();
        assert_eq!(stored.actual_return_date, Some(day(3)));
    }

    #[test]
    fn close_unknown_borrowing() {
        let store = InMemoryStore::new();
        let id = BorrowingId::new();
        assert_eq!(
            store.close_borrowing(id, day(1)).unwrap_err(),
            StoreError::BorrowingNotFound(id)
        );
    }

    #[test]
    fn concurrent_borrows_of_last_copy() {
        let (store, book, user) = store_with_book(1);
        let threads = 8;
        let barrier = Barrier::new(threads);

        let results: Vec<StoreResult<(Borrowing, Book)>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        store.open_borrowing(loan(&book, &user))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == StoreError::InventoryExhausted { book: book.id }));
        assert_eq!(inventory(&store, book.id), 0);
        assert_eq!(store.borrowing_count().unwrap(), 1);
    }

    #[test]
    fn borrowings_filter_and_order() {
        let (store, book, user) = store_with_book(5);
        let other = store.insert_user(User::member("other@example.com")).unwrap();
        let late = Borrowing::open(book.id, user.id, day(3), day(9)).unwrap();
        let early = Borrowing::open(book.id, user.id, day(1), day(2)).unwrap();
        let foreign = Borrowing::open(book.id, other.id, day(2), day(4)).unwrap();
        for b in [late.clone(), early.clone(), foreign] {
            store.open_borrowing(b).unwrap();
        }
        store.close_borrowing(early.id, day(2)).unwrap();

        let mine = store.borrowings(&BorrowingFilter::owned_by(user.id)).unwrap();
        assert_eq!(mine.iter().map(|b| b.id).collect::<Vec<_>>(), [early.id, late.id]);

        let active = store
            .borrowings(&BorrowingFilter::owned_by(user.id).with_active(Some(true)))
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, late.id);

        let overdue = store.borrowings(&BorrowingFilter::overdue_on(day(5))).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].user_id, other.id);
    }

    // -----------------------------------------------------------------------
    // Payments and users
    // -----------------------------------------------------------------------

    fn payment_for(b: &Borrowing, session: &str) -> Payment {
        Payment::pending(
            PaymentKind::Payment,
            b.id,
            session,
            format!("https://pay/{session}"),
            Decimal::new(1750, 2),
        )
    }

    #[test]
    fn payment_requires_borrowing_and_unique_session() {
        let (store, book, user) = store_with_book(1);
        let dangling = loan(&book, &user);
        assert!(matches!(
            store.insert_payment(payment_for(&dangling, "cs_x")),
            Err(StoreError::BorrowingNotFound(_))
        ));

        let (b, _) = store.open_borrowing(dangling).unwrap();
        store.insert_payment(payment_for(&b, "cs_1")).unwrap();
        assert_eq!(
            store.insert_payment(payment_for(&b, "cs_1")).unwrap_err(),
            StoreError::DuplicateSession("cs_1".into())
        );
    }

    #[test]
    fn settle_is_idempotent() {
        let (store, book, user) = store_with_book(1);
        let (b, _) = store.open_borrowing(loan(&book, &user)).unwrap();
        store.insert_payment(payment_for(&b, "cs_1")).unwrap();

        let first = store.settle_payment("cs_1").unwrap();
        assert!(first.is_applied());
        assert!(first.payment().is_paid());

        let second = store.settle_payment("cs_1").unwrap();
        assert!(matches!(second, Settlement::AlreadyPaid(ref p) if p.is_paid()));

        assert_eq!(
            store.settle_payment("cs_missing").unwrap_err(),
            StoreError::SessionNotFound("cs_missing".into())
        );
    }

    #[test]
    fn payments_filtered_by_owner() {
        let (store, book, user) = store_with_book(2);
        let other = store.insert_user(User::member("other@example.com")).unwrap();
        let (mine, _) = store.open_borrowing(loan(&book, &user)).unwrap();
        let (theirs, _) = store
            .open_borrowing(Borrowing::open(book.id, other.id, day(1), day(2)).unwrap())
            .unwrap();
        store.insert_payment(payment_for(&mine, "cs_a")).unwrap();
        store.insert_payment(payment_for(&theirs, "cs_b")).unwrap();

        let filter = PaymentFilter { user_id: Some(user.id), ..PaymentFilter::default() };
        let found = store.payments(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].session_id, "cs_a");
        assert_eq!(store.payments(&PaymentFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn user_emails_are_unique() {
        let store = InMemoryStore::new();
        store.insert_user(User::member("a@example.com")).unwrap();
        assert_eq!(
            store.insert_user(User::staff("A@Example.com")).unwrap_err(),
            StoreError::DuplicateEmail("A@Example.com".into())
        );
    }

    // -----------------------------------------------------------------------
    // Inventory invariant
    // -----------------------------------------------------------------------

    #[derive(Clone, Debug)]
    enum Op {
        Borrow,
        Return(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Borrow), (0usize..16).prop_map(Op::Return)]
    }

    proptest! {
        #[test]
        fn inventory_tracks_outstanding_loans(
            initial in 0u32..5,
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let (store, book, user) = store_with_book(initial);
            let mut opened: Vec<BorrowingId> = Vec::new();

            for op in ops {
                match op {
                    Op::Borrow => {
                        if let Ok((b, _)) = store.open_borrowing(loan(&book, &user)) {
                            opened.push(b.id);
                        }
                    }
                    Op::Return(i) => {
                        if let Some(id) = opened.get(i % opened.len().max(1)) {
                            let _ = store.close_borrowing(*id, day(2));
                        }
                    }
                }

                let active = store
                    .borrowings(&BorrowingFilter::default().with_active(Some(true)))
                    .unwrap()
                    .len() as u32;
                prop_assert_eq!(inventory(&store, book.id) + active, initial);
            }
        }
    }
}
