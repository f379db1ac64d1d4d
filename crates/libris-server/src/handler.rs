use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use libris_ledger::{BorrowingQuery, LedgerError};
use libris_types::{BookId, BorrowingId};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use crate::views::{
    BookDetail, BookSummary, BookWrite, BorrowingCreate, BorrowingDetail, BorrowingParams,
    BorrowingSummary, PaymentSummary, ReconcileView, SessionParams, SessionStatusView,
    SessionView, SweepView,
};

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "libris",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---- Books ----

pub async fn create_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<BookWrite>,
) -> ApiResult<(StatusCode, Json<BookDetail>)> {
    let book = state.catalog.create_book(&user, body.into())?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

pub async fn list_books(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> ApiResult<Json<Vec<BookSummary>>> {
    let books = state.catalog.list_books()?;
    Ok(Json(books.iter().map(BookSummary::from).collect()))
}

pub async fn get_book(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    ApiPath(id): ApiPath<BookId>,
) -> ApiResult<Json<BookDetail>> {
    Ok(Json(state.catalog.get_book(id)?.into()))
}

pub async fn update_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<BookId>,
    ApiJson(body): ApiJson<BookWrite>,
) -> ApiResult<Json<BookDetail>> {
    Ok(Json(state.catalog.update_book(&user, id, body.into())?.into()))
}

pub async fn delete_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<BookId>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_book(&user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Borrowings ----

pub async fn create_borrowing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<BorrowingCreate>,
) -> ApiResult<(StatusCode, Json<BorrowingSummary>)> {
    let borrowing = state
        .loans
        .create_borrowing(&user, body.book_id, body.expected_return_date)?;
    Ok((StatusCode::CREATED, Json((&borrowing).into())))
}

pub async fn list_borrowings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<BorrowingParams>,
) -> ApiResult<Json<Vec<BorrowingSummary>>> {
    let query = BorrowingQuery { owner: params.user, active: params.is_active };
    let loans = state.loans.list_borrowings(&user, &query)?;
    Ok(Json(loans.iter().map(BorrowingSummary::from).collect()))
}

pub async fn get_borrowing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<BorrowingId>,
) -> ApiResult<Json<BorrowingDetail>> {
    let borrowing = state.loans.get_borrowing(&user, id)?;
    let book = state.catalog.get_book(borrowing.book_id).map_err(|e| match e {
        // Books are only deleted together with their loans.
        LedgerError::BookNotFound(_) => ApiError::Internal(e.to_string()),
        other => other.into(),
    })?;
    let payments: Vec<_> = state
        .billing
        .list_payments(&user)?
        .into_iter()
        .filter(|p| p.borrowing_id == id)
        .collect();
    Ok(Json(BorrowingDetail::new(&borrowing, &book, &payments)))
}

pub async fn return_borrowing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<BorrowingId>,
) -> ApiResult<Json<BorrowingSummary>> {
    let borrowing = state.loans.return_borrowing(&user, id)?;
    Ok(Json((&borrowing).into()))
}

// ---- Payments ----

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<PaymentSummary>>> {
    let payments = state.billing.list_payments(&user)?;
    Ok(Json(payments.iter().map(PaymentSummary::from).collect()))
}

pub async fn open_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(borrowing_id): ApiPath<BorrowingId>,
) -> ApiResult<Json<SessionView>> {
    let payment = state.billing.open_session(&user, borrowing_id).await?;
    Ok(Json((&payment).into()))
}

pub async fn open_fine_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(borrowing_id): ApiPath<BorrowingId>,
) -> ApiResult<Json<SessionView>> {
    let payment = state.billing.open_fine_session(&user, borrowing_id).await?;
    Ok(Json((&payment).into()))
}

/// Redirect target after a completed checkout.
pub async fn payment_success(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SessionParams>,
) -> ApiResult<Json<ReconcileView>> {
    let outcome = state.billing.reconcile_session(&params.session_id).await?;
    Ok(Json(outcome.into()))
}

pub async fn session_status(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<String>,
) -> ApiResult<Json<SessionStatusView>> {
    let payment_status = state.billing.session_status(&session_id).await?;
    Ok(Json(SessionStatusView { session_id, payment_status }))
}

/// Redirect target after an abandoned checkout.
pub async fn payment_cancel() -> Json<Value> {
    Json(json!({
        "message": "Payment was cancelled. The session stays open and can be paid later.",
    }))
}

// ---- Admin ----

pub async fn run_sweep(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<SweepView>> {
    if !user.is_staff {
        return Err(ApiError::Forbidden("running the overdue sweep requires staff privileges".into()));
    }
    Ok(Json(state.sweep.run()?.into()))
}
