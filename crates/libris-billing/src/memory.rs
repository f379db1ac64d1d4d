use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::provider::{CheckoutSession, PaymentProvider, SessionRequest, SessionSnapshot};

#[derive(Clone, Debug)]
struct SessionState {
    request: SessionRequest,
    paid: bool,
}

/// A provider that keeps sessions in memory. Sessions start unpaid; call
/// [`InMemoryProvider::mark_paid`] to simulate the customer completing
/// checkout.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    sessions: Mutex<HashMap<String, SessionState>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the session does not exist.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(session_id) {
            Some(state) => {
                state.paid = true;
                true
            }
            None => false,
        }
    }

    /// While set, every call fails with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The request a session was opened with.
    pub fn request(&self, session_id: &str) -> Option<SessionRequest> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .map(|s| s.request.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ProviderError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentProvider for InMemoryProvider {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, ProviderError> {
        self.check_available()?;
        let id = format!("cs_test_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let url = format!("https://checkout.invalid/pay/{id}");
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), SessionState { request: request.clone(), paid: false });
        Ok(CheckoutSession { id, url })
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError> {
        self.check_available()?;
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions
            .get(session_id)
            .ok_or_else(|| ProviderError::UnknownSession(session_id.to_string()))?;
        Ok(SessionSnapshot {
            id: session_id.to_string(),
            payment_status: if state.paid { "paid" } else { "unpaid" }.to_string(),
            client_reference_id: Some(state.request.client_reference_id.clone()),
        })
    }
}
