use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Everything the provider needs to open a hosted checkout page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    /// Amount in the currency's smallest unit.
    pub unit_amount: i64,
    pub currency: String,
    pub product_name: String,
    /// Echoed back on the session; carries the borrowing ID.
    pub client_reference_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A freshly opened checkout session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// The provider's current view of a session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    /// Provider wording, e.g. `paid`, `unpaid`, `no_payment_required`.
    pub payment_status: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
}

impl SessionSnapshot {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// A hosted checkout service.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, ProviderError>;

    async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError>;
}
