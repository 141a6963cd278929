//! Route definitions for the `/admin` area.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET /dashboard    -> get_dashboard (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(admin::get_dashboard))
}
