//! Read-only timetable view for student accounts.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::handlers::timetables::weekly_timetable;
use crate::middleware::rbac::RequireStudent;
use crate::query::ClassIdParams;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/student/timetable?class_id=
///
/// The same weekly grid as `/timetables/weekly/{class_id}`.
pub async fn get_student_timetable(
    RequireStudent(_student): RequireStudent,
    State(state): State<AppState>,
    Query(params): Query<ClassIdParams>,
) -> AppResult<impl IntoResponse> {
    let weekly = weekly_timetable(&state.pool, params.class_id).await?;
    Ok(Json(ApiResponse::ok(weekly)))
}
