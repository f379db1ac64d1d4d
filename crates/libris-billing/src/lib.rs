//! Payment collection for Libris.
//!
//! [`Billing`] prices a loan, opens a hosted checkout session with a
//! [`PaymentProvider`], stores the resulting pending [`Payment`], and later
//! reconciles the session when the provider reports it paid.
//!
//! # Providers
//!
//! - [`StripeProvider`] -- Stripe Checkout over its REST API
//! - [`InMemoryProvider`] -- local sessions for tests and demos
//!
//! [`Payment`]: libris_types::Payment

pub mod error;
pub mod memory;
pub mod pricing;
pub mod provider;
pub mod service;
pub mod stripe;

pub use error::{BillingError, BillingResult, ProviderError};
pub use memory::InMemoryProvider;
pub use pricing::{overdue_fine, rental_fee, FINE_MULTIPLIER};
pub use provider::{CheckoutSession, PaymentProvider, SessionRequest, SessionSnapshot};
pub use service::{Billing, BillingOptions, ReconcileOutcome};
pub use stripe::{StripeConfig, StripeProvider};
