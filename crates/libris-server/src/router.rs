use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Libris endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/books", post(handler::create_book).get(handler::list_books))
        .route(
            "/books/:id",
            get(handler::get_book)
                .put(handler::update_book)
                .delete(handler::delete_book),
        )
        .route(
            "/borrowings",
            post(handler::create_borrowing).get(handler::list_borrowings),
        )
        .route("/borrowings/:id", get(handler::get_borrowing))
        .route("/borrowings/:id/return", post(handler::return_borrowing))
        .route("/payments", get(handler::list_payments))
        .route("/payments/success", get(handler::payment_success))
        .route("/payments/cancel", get(handler::payment_cancel))
        .route("/payments/status/:session_id", get(handler::session_status))
        .route("/payments/:borrowing_id", post(handler::open_session))
        .route("/payments/:borrowing_id/fine", post(handler::open_fine_session))
        .route("/admin/sweep", post(handler::run_sweep))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
