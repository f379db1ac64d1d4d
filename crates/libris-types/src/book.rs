use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::BookId;

/// Maximum length, in characters, of a book's title or author.
pub const MAX_TEXT_LEN: usize = 100;

/// Binding of a physical copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cover {
    #[default]
    Hard,
    Soft,
}

impl fmt::Display for Cover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard => write!(f, "hard"),
            Self::Soft => write!(f, "soft"),
        }
    }
}

/// A catalog entry and its count of copies currently available to lend.
///
/// `inventory` is mutated by the loan ledger on every borrow and return and
/// by catalog edits. Being unsigned, it cannot go negative; the store
/// rejects a borrow instead of decrementing past zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub cover: Cover,
    pub inventory: u32,
    pub daily_fee: Decimal,
}

impl Book {
    /// Validate a draft and assign it a fresh identifier.
    pub fn from_draft(draft: BookDraft) -> Result<Self, TypeError> {
        let draft = draft.validated()?;
        Ok(Self {
            id: BookId::new(),
            title: draft.title,
            author: draft.author,
            cover: draft.cover,
            inventory: draft.inventory,
            daily_fee: draft.daily_fee,
        })
    }

    /// Replace every editable field with the draft's values.
    pub fn apply(&mut self, draft: BookDraft) -> Result<(), TypeError> {
        let draft = draft.validated()?;
        self.title = draft.title;
        self.author = draft.author;
        self.cover = draft.cover;
        self.inventory = draft.inventory;
        self.daily_fee = draft.daily_fee;
        Ok(())
    }

    /// Returns `true` if at least one copy can be lent right now.
    pub fn has_copies(&self) -> bool {
        self.inventory > 0
    }
}

/// Editable fields of a [`Book`], as supplied by catalog management.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: Cover,
    pub inventory: u32,
    pub daily_fee: Decimal,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        inventory: u32,
        daily_fee: Decimal,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            cover: Cover::default(),
            inventory,
            daily_fee,
        }
    }

    pub fn with_cover(mut self, cover: Cover) -> Self {
        self.cover = cover;
        self
    }

    /// Trim text fields and check every field against catalog limits.
    ///
    /// The fee must be non-negative, carry at most two decimal places and
    /// stay below 1000.
    pub fn validated(mut self) -> Result<Self, TypeError> {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();

        for (field, value) in [("title", &self.title), ("author", &self.author)] {
            if value.is_empty() {
                return Err(TypeError::InvalidBook(format!("{field} must not be blank")));
            }
            if value.chars().count() > MAX_TEXT_LEN {
                return Err(TypeError::InvalidBook(format!(
                    "{field} must be at most {MAX_TEXT_LEN} characters"
                )));
            }
        }

        if self.daily_fee < Decimal::ZERO {
            return Err(TypeError::InvalidBook("daily fee must not be negative".into()));
        }
        if self.daily_fee.normalize().scale() > 2 {
            return Err(TypeError::InvalidBook(
                "daily fee must have at most two decimal places".into(),
            ));
        }
        if self.daily_fee >= Decimal::new(1000, 0) {
            return Err(TypeError::InvalidBook("daily fee must be below 1000".into()));
        }
        self.daily_fee = self.daily_fee.round_dp(2);

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookDraft {
        BookDraft::new("Dune", "Frank Herbert", 3, Decimal::new(250, 2))
    }

    #[test]
    fn from_draft_assigns_id_and_keeps_fields() {
        let book = Book::from_draft(draft()).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.cover, Cover::Hard);
        assert_eq!(book.inventory, 3);
        assert!(book.has_copies());
    }

    #[test]
    fn text_fields_are_trimmed() {
        let mut d = draft();
        d.title = "  Dune  ".into();
        assert_eq!(d.validated().unwrap().title, "Dune");
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut d = draft();
        d.title = "   ".into();
        let err = d.validated().unwrap_err();
        assert_eq!(err, TypeError::InvalidBook("title must not be blank".into()));
    }

    #[test]
    fn overlong_author_is_rejected() {
        let mut d = draft();
        d.author = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(d.validated().is_err());
    }

    #[test]
    fn fee_limits() {
        let mut d = draft();
        d.daily_fee = Decimal::new(-1, 2);
        assert!(d.clone().validated().is_err());

        d.daily_fee = Decimal::new(1234, 3);
        assert!(d.clone().validated().is_err());

        d.daily_fee = Decimal::new(1000, 0);
        assert!(d.clone().validated().is_err());

        d.daily_fee = Decimal::new(99999, 2);
        assert!(d.clone().validated().is_ok());

        // Trailing zeros beyond two places are not extra precision.
        d.daily_fee = Decimal::new(2500, 3);
        assert_eq!(d.validated().unwrap().daily_fee, Decimal::new(250, 2));
    }

    #[test]
    fn zero_inventory_has_no_copies() {
        let mut book = Book::from_draft(draft()).unwrap();
        book.inventory = 0;
        assert!(!book.has_copies());
    }

    #[test]
    fn apply_replaces_fields() {
        let mut book = Book::from_draft(draft()).unwrap();
        let id = book.id;
        book.apply(draft().with_cover(Cover::Soft)).unwrap();
        assert_eq!(book.id, id);
        assert_eq!(book.cover, Cover::Soft);
    }

    #[test]
    fn cover_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Cover::Soft).unwrap(), "\"soft\"");
        let draft: BookDraft = serde_json::from_str(
            r#"{"title":"T","author":"A","inventory":1,"daily_fee":"1.50"}"#,
        )
        .unwrap();
        assert_eq!(draft.cover, Cover::Hard);
    }
}
