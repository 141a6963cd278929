use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable or behind.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Highest applied migration version.
    pub schema_version: Option<i64>,
    /// Whether every bundled migration has been applied.
    pub migrations_current: bool,
}

/// GET /health
///
/// A reachable database whose migration ledger lags the binary reports
/// `degraded`.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let schema = match timetable_db::schema_status(&state.pool).await {
        Ok(schema) => Some(schema),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read schema status");
            None
        }
    };

    let db_healthy = schema.is_some();
    let migrations_current = schema.is_some_and(|s| s.is_current());
    let status = if db_healthy && migrations_current {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version: schema.and_then(|s| s.applied),
        migrations_current,
    })
}

/// Mount health check routes (root level, outside `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
