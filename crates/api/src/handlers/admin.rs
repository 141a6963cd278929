//! Admin dashboard.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use timetable_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/admin/dashboard
///
/// Entity counts plus the number of change requests awaiting a decision.
pub async fn get_dashboard(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = DashboardRepo::stats(&state.pool).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
