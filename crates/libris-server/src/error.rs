use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use libris_billing::{BillingError, ProviderError};
use libris_ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

/// Errors from assembling and running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] libris_store::StoreError),

    #[error("notifier error: {0}")]
    Notify(#[from] libris_notify::NotifyError),

    #[error("payment provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// An error as seen by an HTTP client. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Logged in full; the client only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error.message = %detail, "unexpected error while handling request");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BookNotFound(_)
            | LedgerError::BorrowingNotFound(_)
            | LedgerError::UserNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::Forbidden(_) => Self::Forbidden(err.to_string()),
            LedgerError::InventoryExhausted { .. }
            | LedgerError::AlreadyReturned { .. }
            | LedgerError::BookOnLoan { .. }
            | LedgerError::Invalid(_) => Self::BadRequest(err.to_string()),
            LedgerError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::BorrowingNotFound(_)
            | BillingError::BookNotFound(_)
            | BillingError::SessionNotFound(_) => Self::NotFound(err.to_string()),
            BillingError::NoFineDue(_)
            | BillingError::ReferenceMismatch { .. }
            | BillingError::InvalidAmount(_)
            | BillingError::Provider(_) => Self::BadRequest(err.to_string()),
            BillingError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::AuthFailed(_) => Self::Unauthorized(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
