//! Route definitions for CSV import and export.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transfer;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/csv`.
///
/// ```text
/// POST /import/subjects      -> import_subjects (admin, multipart "file")
/// POST /import/timetables    -> import_timetables (admin, multipart "file")
/// GET  /export/timetables    -> export_timetables (teacher or admin)
/// GET  /export/subjects      -> export_subjects (teacher or admin)
/// ```
///
/// Import bodies may be up to `max_upload_bytes` plus multipart framing.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    let imports = Router::new()
        .route("/import/subjects", post(transfer::import_subjects))
        .route("/import/timetables", post(transfer::import_timetables))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ));

    Router::new()
        .merge(imports)
        .route("/export/timetables", get(transfer::export_timetables))
        .route("/export/subjects", get(transfer::export_subjects))
}
