use std::sync::Arc;
use std::time::Duration;

use libris_billing::{Billing, BillingOptions, InMemoryProvider, PaymentProvider, StripeProvider};
use libris_ledger::{Catalog, LoanLedger, OverdueSweep};
use libris_notify::{
    run_worker, LogNotifier, Notification, NotificationQueue, Notifier, TelegramNotifier,
};
use libris_store::{Datastore, InMemoryStore};
use libris_types::{Clock, SystemClock, User};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auth::{AuthProvider, TokenAuth};
use crate::config::LibrisConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Collaborators injected into the services. [`Components::from_config`]
/// builds the production set; tests swap in their own.
#[derive(Clone)]
pub struct Components {
    pub store: Arc<dyn Datastore>,
    pub notifier: Arc<dyn Notifier>,
    pub provider: Arc<dyn PaymentProvider>,
    pub clock: Arc<dyn Clock>,
}

impl Components {
    pub fn from_config(config: &LibrisConfig) -> ServerResult<Self> {
        let notifier: Arc<dyn Notifier> = match &config.notify.telegram {
            Some(telegram) => Arc::new(TelegramNotifier::new(telegram)?),
            None => {
                warn!("no telegram channel configured; notifications go to the log");
                Arc::new(LogNotifier)
            }
        };
        let provider: Arc<dyn PaymentProvider> = match &config.billing.stripe {
            Some(stripe) => Arc::new(StripeProvider::new(stripe)?),
            None => {
                warn!("no stripe account configured; checkout sessions stay in memory");
                Arc::new(InMemoryProvider::new())
            }
        };
        Ok(Self {
            store: Arc::new(InMemoryStore::new()),
            notifier,
            provider,
            clock: Arc::new(SystemClock),
        })
    }
}

/// Insert configured users and register their tokens.
fn provision_users(config: &LibrisConfig, store: &dyn Datastore) -> ServerResult<TokenAuth> {
    let auth = TokenAuth::new();
    for entry in &config.users {
        let mut user = if entry.is_staff {
            User::staff(entry.email.clone())
        } else {
            User::member(entry.email.clone())
        };
        if let Some(id) = entry.id {
            user.id = id;
        }
        let user = store.insert_user(user)?;
        auth.insert(entry.token.clone(), user.id);
        info!(user_id = %user.id, email = %user.email, is_staff = user.is_staff, "user provisioned");
    }
    Ok(auth)
}

/// Libris HTTP server.
pub struct LibrisServer {
    config: LibrisConfig,
    state: AppState,
    notifier: Arc<dyn Notifier>,
    outbox: UnboundedReceiver<Notification>,
}

impl LibrisServer {
    /// Assemble a server from configuration with the production collaborators.
    pub fn new(config: LibrisConfig) -> ServerResult<Self> {
        let components = Components::from_config(&config)?;
        Self::with_components(config, components)
    }

    /// Assemble a server around the given collaborators.
    ///
    /// Notifications raised before [`LibrisServer::serve`] starts the
    /// delivery worker are held in the queue.
    pub fn with_components(config: LibrisConfig, components: Components) -> ServerResult<Self> {
        let Components { store, notifier, provider, clock } = components;
        let auth = provision_users(&config, store.as_ref())?;

        let (queue, outbox) = NotificationQueue::unbounded();
        let billing = Billing::new(
            store.clone(),
            provider,
            queue.clone(),
            clock.clone(),
            BillingOptions {
                currency: config.billing.currency.clone(),
                public_url: config.server.public_url.trim_end_matches('/').to_string(),
            },
        );
        let auth: Arc<dyn AuthProvider> = Arc::new(auth);
        let state = AppState {
            store: store.clone(),
            auth,
            catalog: Catalog::new(store.clone()),
            loans: LoanLedger::new(store.clone(), queue.clone(), clock.clone()),
            sweep: OverdueSweep::new(store, queue, clock),
            billing,
        };
        Ok(Self { config, state, notifier, outbox })
    }

    pub fn config(&self) -> &LibrisConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    fn spawn_sweep(&self) -> Option<JoinHandle<()>> {
        if !self.config.sweep.enabled {
            info!("scheduled overdue sweep disabled");
            return None;
        }
        let period = Duration::from_secs(self.config.sweep.interval_secs.max(1));
        info!(interval_secs = period.as_secs(), "scheduling overdue sweep");
        Some(self.state.sweep.clone().spawn(period))
    }

    /// Start the background tasks and serve requests until the listener
    /// fails.
    pub async fn serve(self) -> ServerResult<()> {
        let sweep = self.spawn_sweep();
        let Self { config, state, notifier, outbox } = self;
        let worker = tokio::spawn(run_worker(outbox, notifier, config.notify.queue_config()));

        let app = build_router(state);
        let listener = TcpListener::bind(&config.server.bind_addr).await?;
        info!("Libris server listening on {}", config.server.bind_addr);
        let served = axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        if let Some(sweep) = sweep {
            sweep.abort();
        }
        worker.abort();
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserEntry;
    use libris_types::UserId;

    fn config_with_users() -> LibrisConfig {
        let mut config = LibrisConfig::default();
        config.users = vec![
            UserEntry {
                email: "staff@example.com".into(),
                token: "staff-token".into(),
                is_staff: true,
                id: None,
            },
            UserEntry {
                email: "reader@example.com".into(),
                token: "reader-token".into(),
                is_staff: false,
                id: Some(UserId::new()),
            },
        ];
        config
    }

    #[tokio::test]
    async fn server_construction_provisions_users() {
        let config = config_with_users();
        let fixed = config.users[1].id;
        let server = LibrisServer::new(config).unwrap();
        assert_eq!(server.config().users.len(), 2);

        let identity = server
            .state
            .auth
            .authenticate(&crate::auth::Credentials::Bearer("reader-token".into()))
            .await
            .unwrap();
        assert_eq!(Some(identity.user_id), fixed);
        let user = server.state.store.user(identity.user_id).unwrap().unwrap();
        assert!(!user.is_staff);
    }

    #[test]
    fn duplicate_emails_are_rejected() {
        let mut config = config_with_users();
        config.users[1].email = "STAFF@example.com".into();
        assert!(matches!(LibrisServer::new(config), Err(ServerError::Store(_))));
    }

    #[test]
    fn blank_stripe_key_fails_startup() {
        let mut config = LibrisConfig::default();
        config.billing.stripe = Some(libris_billing::StripeConfig {
            secret_key: " ".into(),
            api_base: "https://api.stripe.com".into(),
        });
        assert!(matches!(LibrisServer::new(config), Err(ServerError::Provider(_))));
    }

    #[test]
    fn router_builds() {
        let server = LibrisServer::new(LibrisConfig::default()).unwrap();
        let _router = server.router();
    }
}
