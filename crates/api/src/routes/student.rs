//! Route definitions for the `/student` views.

use axum::routing::get;
use axum::Router;

use crate::handlers::student;
use crate::state::AppState;

/// Routes mounted at `/student`.
///
/// ```text
/// GET /timetable?class_id=    -> get_student_timetable (student)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/timetable", get(student::get_student_timetable))
}
