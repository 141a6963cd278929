//! Route definitions for the `/subjects` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::subjects;
use crate::state::AppState;

/// Routes mounted at `/subjects`.
///
/// ```text
/// GET    /        -> list_subjects (category, term, limit, offset)
/// POST   /        -> create_subject (admin)
/// GET    /{id}    -> get_subject
/// PUT    /{id}    -> update_subject (admin)
/// DELETE /{id}    -> delete_subject (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/{id}",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
}
