//! Stripe Checkout adapter.
//!
//! Opens `mode=payment` sessions with a single inline-priced line item and
//! reads them back by ID. Only the fields Libris needs are decoded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::{CheckoutSession, PaymentProvider, SessionRequest, SessionSnapshot};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StripeProvider {
    client: Client,
    sessions_url: String,
    secret_key: String,
}

impl StripeProvider {
    pub fn new(config: &StripeConfig) -> Result<Self, ProviderError> {
        if config.secret_key.trim().is_empty() {
            return Err(ProviderError::Config("stripe secret_key is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            sessions_url: format!("{}/v1/checkout/sessions", config.api_base.trim_end_matches('/')),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Form fields for a checkout session, in Stripe's bracketed notation.
    fn session_form(request: &SessionRequest) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("client_reference_id", request.client_reference_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", request.currency.to_lowercase()),
            ("line_items[0][price_data][unit_amount]", request.unit_amount.to_string()),
            ("line_items[0][price_data][product_data][name]", request.product_name.clone()),
        ]
    }

    /// Decode a success body, or turn an error body into `Rejected`.
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Rejected { status: status.as_u16(), message });
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, ProviderError> {
        let response = self
            .client
            .post(&self.sessions_url)
            .bearer_auth(&self.secret_key)
            .form(&Self::session_form(request))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError> {
        let response = self
            .client
            .get(format!("{}/{}", self.sessions_url, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::UnknownSession(session_id.to_string()));
        }
        Self::decode(response).await
    }
}
