//! Route definitions for the `/timetables` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::timetables;
use crate::state::AppState;

/// Routes mounted at `/timetables`.
///
/// ```text
/// GET    /                     -> list_timetables
/// POST   /                     -> create_timetable (admin)
/// GET    /weekly/{class_id}    -> get_weekly
/// GET    /{id}                 -> get_timetable
/// PUT    /{id}                 -> update_timetable (admin)
/// DELETE /{id}                 -> delete_timetable (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(timetables::list_timetables).post(timetables::create_timetable),
        )
        .route("/weekly/{class_id}", get(timetables::get_weekly))
        .route(
            "/{id}",
            get(timetables::get_timetable)
                .put(timetables::update_timetable)
                .delete(timetables::delete_timetable),
        )
}
