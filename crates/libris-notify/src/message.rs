use std::fmt;

use chrono::NaiveDate;
use libris_types::PaymentKind;
use rust_decimal::Decimal;

/// An event worth telling the library staff about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    NewBorrowing {
        book_title: String,
        borrower: String,
        borrow_date: NaiveDate,
        expected_return_date: NaiveDate,
    },
    Overdue {
        book_title: String,
        borrower: String,
        borrow_date: NaiveDate,
        expected_return_date: NaiveDate,
    },
    /// Sent once by a sweep that found nothing overdue.
    NoOverdue { date: NaiveDate },
    PaymentSucceeded {
        book_title: String,
        borrower: String,
        kind: PaymentKind,
        amount: Decimal,
        session_id: String,
    },
}

impl Notification {
    /// Short machine-friendly name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewBorrowing { .. } => "new_borrowing",
            Self::Overdue { .. } => "overdue",
            Self::NoOverdue { .. } => "no_overdue",
            Self::PaymentSucceeded { .. } => "payment_succeeded",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewBorrowing { book_title, borrower, borrow_date, expected_return_date } => {
                writeln!(f, "New borrowing:")?;
                write!(
                    f,
                    "Book: '{book_title}', Borrower: {borrower}, Borrowed on: {borrow_date}, \
                     Expected return: {expected_return_date}"
                )
            }
            Self::Overdue { book_title, borrower, borrow_date, expected_return_date } => {
                writeln!(f, "Overdue borrowing:")?;
                write!(
                    f,
                    "Book: '{book_title}', Borrower: {borrower}, Borrowed on: {borrow_date}, \
                     Expected return: {expected_return_date}"
                )
            }
            Self::NoOverdue { date } => write!(f, "No borrowings overdue today ({date})!"),
            Self::PaymentSucceeded { book_title, borrower, kind, amount, session_id } => {
                writeln!(f, "Payment successful:")?;
                write!(
                    f,
                    "{kind} of {amount} for '{book_title}' by {borrower} (session {session_id})"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn overdue_message_carries_loan_details() {
        let text = Notification::Overdue {
            book_title: "Dune".into(),
            borrower: "reader@example.com".into(),
            borrow_date: date(2),
            expected_return_date: date(9),
        }
        .to_string();
        assert!(text.starts_with("Overdue borrowing:\n"));
        assert!(text.contains("'Dune'"));
        assert!(text.contains("reader@example.com"));
        assert!(text.contains("2024-01-02"));
        assert!(text.contains("2024-01-09"));
    }

    #[test]
    fn payment_message_mentions_amount_and_kind() {
        let n = Notification::PaymentSucceeded {
            book_title: "Dune".into(),
            borrower: "reader@example.com".into(),
            kind: PaymentKind::Fine,
            amount: Decimal::new(1000, 2),
            session_id: "cs_1".into(),
        };
        let text = n.to_string();
        assert!(text.contains("fine of 10.00"));
        assert_eq!(n.kind(), "payment_succeeded");
    }

    #[test]
    fn no_overdue_is_a_single_line() {
        let text = Notification::NoOverdue { date: date(5) }.to_string();
        assert_eq!(text, "No borrowings overdue today (2024-01-05)!");
    }
}
