use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::id::{BorrowingId, PaymentId};

/// Settlement state of a [`Payment`]. Moves from `Pending` to `Paid` only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// What a payment is charging for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// The rental fee for the loan period.
    Payment,
    /// A penalty for returning late.
    Fine,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::Fine => write!(f, "fine"),
        }
    }
}

/// A checkout session opened with the payment provider for a borrowing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub kind: PaymentKind,
    pub borrowing_id: BorrowingId,
    pub session_url: String,
    pub session_id: String,
    pub money_to_pay: Decimal,
}

impl Payment {
    /// A new pending payment for a freshly opened session.
    pub fn pending(
        kind: PaymentKind,
        borrowing_id: BorrowingId,
        session_id: impl Into<String>,
        session_url: impl Into<String>,
        money_to_pay: Decimal,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            status: PaymentStatus::Pending,
            kind,
            borrowing_id,
            session_url: session_url.into(),
            session_id: session_id.into(),
            money_to_pay,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}
