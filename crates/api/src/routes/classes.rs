//! Route definitions for the `/classes` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::classes;
use crate::state::AppState;

/// Routes mounted at `/classes`.
///
/// ```text
/// GET    /        -> list_classes
/// POST   /        -> create_class (admin)
/// GET    /{id}    -> get_class
/// PUT    /{id}    -> update_class (admin)
/// DELETE /{id}    -> delete_class (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/{id}",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
}
