//! HTTP server for Libris.
//!
//! Exposes the catalog, the loan ledger and billing as a JSON API behind
//! bearer-token authentication, and runs the notification worker and the
//! scheduled overdue sweep alongside it.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;
pub mod views;

pub use auth::{AuthProvider, Credentials, CurrentUser, Identity, TokenAuth};
pub use config::{
    BillingSection, LibrisConfig, NotifySection, ServerSection, SweepSection, UserEntry,
};
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use server::{Components, LibrisServer};
pub use state::AppState;
