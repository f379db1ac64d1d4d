use std::sync::Arc;

use libris_notify::{Notification, NotificationQueue};
use libris_store::{Datastore, PaymentFilter, Settlement};
use libris_types::{Book, Borrowing, BorrowingId, Clock, Payment, PaymentKind, User};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{BillingError, BillingResult};
use crate::pricing;
use crate::provider::{PaymentProvider, SessionRequest};

/// Where the provider sends the customer after checkout, and what currency
/// to charge in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingOptions {
    pub currency: String,
    /// Public base URL of this service, without a trailing slash.
    pub public_url: String,
}

impl BillingOptions {
    fn success_url(&self) -> String {
        format!("{}/payments/success?session_id={{CHECKOUT_SESSION_ID}}", self.public_url)
    }

    fn cancel_url(&self) -> String {
        format!("{}/payments/cancel", self.public_url)
    }
}

/// Result of reconciling a checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The payment was marked paid by this call.
    Paid(Payment),
    /// Nothing to do; the payment had already been recorded as paid.
    AlreadyPaid(Payment),
    /// The provider does not consider the session paid yet.
    Unpaid { payment_status: String },
}

/// Opens checkout sessions for loans and records their settlement.
///
/// Store calls are synchronous and never span a provider call, so no lock
/// is held while waiting on the network.
#[derive(Clone)]
pub struct Billing {
    store: Arc<dyn Datastore>,
    provider: Arc<dyn PaymentProvider>,
    notifications: NotificationQueue,
    clock: Arc<dyn Clock>,
    options: BillingOptions,
}

impl Billing {
    pub fn new(
        store: Arc<dyn Datastore>,
        provider: Arc<dyn PaymentProvider>,
        notifications: NotificationQueue,
        clock: Arc<dyn Clock>,
        options: BillingOptions,
    ) -> Self {
        Self { store, provider, notifications, clock, options }
    }

    /// Open a session charging the rental fee for a loan.
    pub async fn open_session(&self, requester: &User, borrowing_id: BorrowingId) -> BillingResult<Payment> {
        let (borrowing, book) = self.visible_loan(requester, borrowing_id)?;
        let amount = pricing::rental_fee(&book, &borrowing);
        self.open(PaymentKind::Payment, &borrowing, &book, amount).await
    }

    /// Open a session charging the late-return fine for a loan.
    pub async fn open_fine_session(
        &self,
        requester: &User,
        borrowing_id: BorrowingId,
    ) -> BillingResult<Payment> {
        let (borrowing, book) = self.visible_loan(requester, borrowing_id)?;
        let amount = pricing::overdue_fine(&book, &borrowing, self.clock.today())
            .ok_or(BillingError::NoFineDue(borrowing_id))?;
        self.open(PaymentKind::Fine, &borrowing, &book, amount).await
    }

    /// Check a session with the provider and record the payment once it is
    /// paid. Safe to call repeatedly for the same session.
    pub async fn reconcile_session(&self, session_id: &str) -> BillingResult<ReconcileOutcome> {
        let snapshot = self.provider.get_session(session_id).await?;
        if !snapshot.is_paid() {
            return Ok(ReconcileOutcome::Unpaid { payment_status: snapshot.payment_status });
        }

        let payment = self
            .store
            .payment_by_session(session_id)?
            .ok_or_else(|| BillingError::SessionNotFound(session_id.to_string()))?;
        let referenced: Option<BorrowingId> =
            snapshot.client_reference_id.as_deref().and_then(|r| r.parse().ok());
        if referenced != Some(payment.borrowing_id) {
            return Err(BillingError::ReferenceMismatch {
                session_id: session_id.to_string(),
                reference: snapshot.client_reference_id,
            });
        }
        let borrowing = self
            .store
            .borrowing(payment.borrowing_id)?
            .ok_or(BillingError::BorrowingNotFound(payment.borrowing_id))?;
        // Looked up before settling so a failure leaves the payment pending.
        let (book_title, borrower) = self.labels(&borrowing)?;

        match self.store.settle_payment(session_id)? {
            Settlement::AlreadyPaid(payment) => {
                info!(session_id, "session already reconciled");
                Ok(ReconcileOutcome::AlreadyPaid(payment))
            }
            Settlement::Applied(payment) => {
                info!(
                    session_id,
                    payment_id = %payment.id,
                    borrowing_id = %borrowing.id,
                    amount = %payment.money_to_pay,
                    "payment settled"
                );
                self.notifications.enqueue(Notification::PaymentSucceeded {
                    book_title,
                    borrower,
                    kind: payment.kind,
                    amount: payment.money_to_pay,
                    session_id: payment.session_id.clone(),
                });
                Ok(ReconcileOutcome::Paid(payment))
            }
        }
    }

    /// The provider's status wording for a session.
    pub async fn session_status(&self, session_id: &str) -> BillingResult<String> {
        Ok(self.provider.get_session(session_id).await?.payment_status)
    }

    /// Staff see every payment; everyone else sees payments on their own
    /// loans.
    pub fn list_payments(&self, requester: &User) -> BillingResult<Vec<Payment>> {
        let filter = PaymentFilter {
            user_id: if requester.is_staff { None } else { Some(requester.id) },
            ..PaymentFilter::default()
        };
        Ok(self.store.payments(&filter)?)
    }

    fn visible_loan(&self, requester: &User, id: BorrowingId) -> BillingResult<(Borrowing, Book)> {
        let borrowing = match self.store.borrowing(id)? {
            Some(b) if requester.can_access(b.user_id) => b,
            _ => return Err(BillingError::BorrowingNotFound(id)),
        };
        let book = self
            .store
            .book(borrowing.book_id)?
            .ok_or(BillingError::BookNotFound(borrowing.book_id))?;
        Ok((borrowing, book))
    }

    async fn open(
        &self,
        kind: PaymentKind,
        borrowing: &Borrowing,
        book: &Book,
        amount: Decimal,
    ) -> BillingResult<Payment> {
        let unit_amount = pricing::minor_units(amount).ok_or(BillingError::InvalidAmount(amount))?;
        let label = match kind {
            PaymentKind::Payment => "Rental",
            PaymentKind::Fine => "Late return fine",
        };
        let request = SessionRequest {
            unit_amount,
            currency: self.options.currency.clone(),
            product_name: format!("{label}: {}", book.title),
            client_reference_id: borrowing.id.to_string(),
            success_url: self.options.success_url(),
            cancel_url: self.options.cancel_url(),
        };

        let session = self.provider.create_session(&request).await.map_err(|e| {
            warn!(borrowing_id = %borrowing.id, error = %e, "checkout session not created");
            e
        })?;

        let payment = self.store.insert_payment(Payment::pending(
            kind,
            borrowing.id,
            session.id,
            session.url,
            amount,
        ))?;
        info!(
            payment_id = %payment.id,
            borrowing_id = %borrowing.id,
            %kind,
            amount = %amount,
            "checkout session opened"
        );
        Ok(payment)
    }

    /// Book title and borrower email for messages, falling back to IDs.
    fn labels(&self, borrowing: &Borrowing) -> BillingResult<(String, String)> {
        let book_title = match self.store.book(borrowing.book_id)? {
            Some(book) => book.title,
            None => borrowing.book_id.to_string(),
        };
        let borrower = match self.store.user(borrowing.user_id)? {
            Some(user) => user.email,
            None => borrowing.user_id.to_string(),
        };
        Ok((book_title, borrower))
    }
}

impl std::fmt::Debug for Billing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Billing").field("options", &self.options).finish_non_exhaustive()
    }
}
