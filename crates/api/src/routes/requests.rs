//! Route definitions for the `/requests` resource (change requests).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// GET    /                -> list_requests (teacher or admin)
/// POST   /                -> create_request (teacher or admin)
/// GET    /{id}            -> get_request (teacher or admin)
/// PUT    /{id}            -> update_request (teacher or admin, pending only)
/// DELETE /{id}            -> delete_request (admin)
/// POST   /{id}/approve    -> approve_request (admin)
/// POST   /{id}/reject     -> reject_request (admin)
/// POST   /{id}/cancel     -> cancel_request (requester or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/{id}",
            get(requests::get_request)
                .put(requests::update_request)
                .delete(requests::delete_request),
        )
        .route("/{id}/approve", post(requests::approve_request))
        .route("/{id}/reject", post(requests::reject_request))
        .route("/{id}/cancel", post(requests::cancel_request))
}
