//! Amounts charged for a loan.
//!
//! Rental: `daily_fee * billable_days`, where the loan is billed up to its
//! actual return if it has one and up to the expected return date otherwise,
//! and never for less than a day.
//!
//! Fine: `daily_fee * FINE_MULTIPLIER * overdue_days`, charged only when the
//! book came back (or is still out) after the expected return date.
//!
//! Both are rounded to cents, midpoint away from zero.

use chrono::NaiveDate;
use libris_types::{Book, Borrowing};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const FINE_MULTIPLIER: u32 = 2;

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn rental_fee(book: &Book, borrowing: &Borrowing) -> Decimal {
    to_cents(book.daily_fee * Decimal::from(borrowing.billable_days()))
}

/// `None` when the loan is not late as of `today`.
pub fn overdue_fine(book: &Book, borrowing: &Borrowing, today: NaiveDate) -> Option<Decimal> {
    let days = borrowing.overdue_days(today);
    if days <= 0 {
        return None;
    }
    Some(to_cents(book.daily_fee * Decimal::from(FINE_MULTIPLIER) * Decimal::from(days)))
}

/// Convert an amount to the provider's smallest currency unit.
pub fn minor_units(amount: Decimal) -> Option<i64> {
    (to_cents(amount) * Decimal::ONE_HUNDRED).to_i64()
}
