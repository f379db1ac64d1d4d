//! Request and response bodies. Each entity has separate read and write
//! shapes; list endpoints return the lighter summary form.

use chrono::NaiveDate;
use libris_billing::ReconcileOutcome;
use libris_ledger::SweepReport;
use libris_types::{
    Book, BookDraft, BookId, Borrowing, BorrowingId, Cover, Payment, PaymentId, PaymentKind,
    PaymentStatus, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct BookWrite {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: Cover,
    pub inventory: u32,
    pub daily_fee: Decimal,
}

impl From<BookWrite> for BookDraft {
    fn from(w: BookWrite) -> Self {
        BookDraft::new(w.title, w.author, w.inventory, w.daily_fee).with_cover(w.cover)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub daily_fee: Decimal,
    pub available: bool,
}

impl From<&Book> for BookSummary {
    fn from(b: &Book) -> Self {
        Self {
            id: b.id,
            title: b.title.clone(),
            author: b.author.clone(),
            daily_fee: b.daily_fee,
            available: b.has_copies(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BookDetail {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub cover: Cover,
    pub inventory: u32,
    pub daily_fee: Decimal,
}

impl From<Book> for BookDetail {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: b.title,
            author: b.author,
            cover: b.cover,
            inventory: b.inventory,
            daily_fee: b.daily_fee,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BorrowingCreate {
    pub book_id: BookId,
    pub expected_return_date: NaiveDate,
}

/// Query string of `GET /borrowings`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BorrowingParams {
    #[serde(alias = "user_id")]
    pub user: Option<UserId>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BorrowingSummary {
    pub id: BorrowingId,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub book_id: BookId,
    pub user_id: UserId,
    pub is_active: bool,
}

impl From<&Borrowing> for BorrowingSummary {
    fn from(b: &Borrowing) -> Self {
        Self {
            id: b.id,
            borrow_date: b.borrow_date,
            expected_return_date: b.expected_return_date,
            actual_return_date: b.actual_return_date,
            book_id: b.book_id,
            user_id: b.user_id,
            is_active: b.is_active(),
        }
    }
}

/// A loan with its book and payment history inlined.
#[derive(Clone, Debug, Serialize)]
pub struct BorrowingDetail {
    pub id: BorrowingId,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub is_active: bool,
    pub user_id: UserId,
    pub book: BookSummary,
    pub payments: Vec<PaymentSummary>,
}

impl BorrowingDetail {
    pub fn new(borrowing: &Borrowing, book: &Book, payments: &[Payment]) -> Self {
        Self {
            id: borrowing.id,
            borrow_date: borrowing.borrow_date,
            expected_return_date: borrowing.expected_return_date,
            actual_return_date: borrowing.actual_return_date,
            is_active: borrowing.is_active(),
            user_id: borrowing.user_id,
            book: book.into(),
            payments: payments.iter().map(PaymentSummary::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    pub borrowing_id: BorrowingId,
    pub session_url: String,
    pub session_id: String,
    pub money_to_pay: Decimal,
}

impl From<&Payment> for PaymentSummary {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id,
            status: p.status,
            kind: p.kind,
            borrowing_id: p.borrowing_id,
            session_url: p.session_url.clone(),
            session_id: p.session_id.clone(),
            money_to_pay: p.money_to_pay,
        }
    }
}

/// Where to send the customer to pay.
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub session_url: String,
    pub money_to_pay: Decimal,
}

impl From<&Payment> for SessionView {
    fn from(p: &Payment) -> Self {
        Self {
            session_id: p.session_id.clone(),
            session_url: p.session_url.clone(),
            money_to_pay: p.money_to_pay,
        }
    }
}

/// Query string of `GET /payments/success`.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionParams {
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReconcileView {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
}

impl From<ReconcileOutcome> for ReconcileView {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Paid(p) => Self {
                status: "paid",
                message: "Payment successful.".into(),
                payment: Some((&p).into()),
            },
            ReconcileOutcome::AlreadyPaid(p) => Self {
                status: "already_paid",
                message: "Payment was already recorded.".into(),
                payment: Some((&p).into()),
            },
            ReconcileOutcome::Unpaid { payment_status } => Self {
                status: "unpaid",
                message: format!("Payment not completed (status: {payment_status})."),
                payment: None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionStatusView {
    pub session_id: String,
    pub payment_status: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SweepView {
    pub date: NaiveDate,
    pub overdue: Vec<BorrowingId>,
}

impl From<SweepReport> for SweepView {
    fn from(r: SweepReport) -> Self {
        Self { date: r.date, overdue: r.overdue }
    }
}
