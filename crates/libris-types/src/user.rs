use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// An account known to Libris. `is_staff` marks privileged callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub is_staff: bool,
}

impl User {
    pub fn member(email: impl Into<String>) -> Self {
        Self { id: UserId::new(), email: email.into(), is_staff: false }
    }

    pub fn staff(email: impl Into<String>) -> Self {
        Self { id: UserId::new(), email: email.into(), is_staff: true }
    }

    /// Whether this user may see or act on records owned by `owner`.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_staff || self.id == owner
    }
}
