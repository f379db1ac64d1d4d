use std::sync::Arc;

use libris_store::Datastore;
use libris_types::{Book, BookDraft, BookId, User};
use tracing::info;

use crate::error::{LedgerError, LedgerResult};

/// Fail with `Forbidden` unless `user` is staff.
pub(crate) fn require_staff(user: &User, action: &str) -> LedgerResult<()> {
    if user.is_staff {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!("{action} requires staff privileges")))
    }
}

/// Book catalog. Reads are open to every authenticated caller; writes are
/// staff-only.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Datastore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    pub fn create_book(&self, requester: &User, draft: BookDraft) -> LedgerResult<Book> {
        require_staff(requester, "adding a book")?;
        let book = self.store.insert_book(Book::from_draft(draft)?)?;
        info!(book_id = %book.id, title = %book.title, inventory = book.inventory, "book added");
        Ok(book)
    }

    pub fn list_books(&self) -> LedgerResult<Vec<Book>> {
        Ok(self.store.books()?)
    }

    pub fn get_book(&self, id: BookId) -> LedgerResult<Book> {
        self.store.book(id)?.ok_or(LedgerError::BookNotFound(id))
    }

    /// Replace every editable field, inventory included.
    pub fn update_book(&self, requester: &User, id: BookId, draft: BookDraft) -> LedgerResult<Book> {
        require_staff(requester, "editing a book")?;
        let book = self.store.update_book(id, draft)?;
        info!(book_id = %id, inventory = book.inventory, "book updated");
        Ok(book)
    }

    /// Delete a book that has no unreturned loans, along with its loan
    /// history.
    pub fn delete_book(&self, requester: &User, id: BookId) -> LedgerResult<()> {
        require_staff(requester, "deleting a book")?;
        if !self.store.delete_book(id)? {
            return Err(LedgerError::BookNotFound(id));
        }
        info!(book_id = %id, "book deleted");
        Ok(())
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_store::InMemoryStore;
    use libris_types::TypeError;
    use rust_decimal::Decimal;

    fn setup() -> (Catalog, User, User) {
        let catalog = Catalog::new(Arc::new(InMemoryStore::new()));
        (catalog, User::staff("staff@example.com"), User::member("reader@example.com"))
    }

    fn draft(title: &str) -> BookDraft {
        BookDraft::new(title, "Frank Herbert", 2, Decimal::new(250, 2))
    }

    #[test]
    fn staff_manage_books() {
        let (catalog, staff, _) = setup();
        let book = catalog.create_book(&staff, draft("Dune")).unwrap();
        assert_eq!(catalog.get_book(book.id).unwrap(), book);

        let updated = catalog
            .update_book(&staff, book.id, BookDraft::new("Dune", "F. Herbert", 5, Decimal::ONE))
            .unwrap();
        assert_eq!(updated.inventory, 5);
        assert_eq!(updated.author, "F. Herbert");

        catalog.delete_book(&staff, book.id).unwrap();
        assert_eq!(catalog.get_book(book.id), Err(LedgerError::BookNotFound(book.id)));
    }

    #[test]
    fn members_cannot_write() {
        let (catalog, staff, member) = setup();
        assert!(matches!(
            catalog.create_book(&member, draft("Dune")),
            Err(LedgerError::Forbidden(_))
        ));

        let book = catalog.create_book(&staff, draft("Dune")).unwrap();
        assert!(matches!(
            catalog.update_book(&member, book.id, draft("Emma")),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(catalog.delete_book(&member, book.id), Err(LedgerError::Forbidden(_))));
        assert_eq!(catalog.list_books().unwrap().len(), 1);
    }

    #[test]
    fn invalid_drafts_are_rejected() {
        let (catalog, staff, _) = setup();
        let err = catalog.create_book(&staff, draft("  ")).unwrap_err();
        assert!(matches!(err, LedgerError::Invalid(TypeError::InvalidBook(_))));
        assert!(catalog.list_books().unwrap().is_empty());
    }

    #[test]
    fn missing_books_are_not_found() {
        let (catalog, staff, _) = setup();
        let id = BookId::new();
        assert!(catalog.get_book(id).unwrap_err().is_not_found());
        assert_eq!(catalog.delete_book(&staff, id), Err(LedgerError::BookNotFound(id)));
    }
}
