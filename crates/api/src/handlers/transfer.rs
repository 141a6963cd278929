//! CSV bulk import and export (`/csv/...`).
//!
//! Imports are multipart uploads with the file in a field named `file`. A
//! file that cannot be read as a whole (empty, header only, too few columns,
//! broken CSV) fails the request with 400. Otherwise every data row is
//! validated and saved on its own, and failures are collected in the
//! returned [`ImportResult`].

use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use timetable_core::timetable::format_class_label;
use timetable_core::transfer::{
    format_cell, has_csv_extension, parse_subject_rows, parse_timetable_rows, timetable_headers,
    timetable_slots, write_csv, ImportErrorRow, ImportResult, CSV_EXTENSION, SUBJECT_HEADERS,
};
use timetable_db::repositories::transfer_repo::RowFailure;
use timetable_db::repositories::TransferRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireTeacher};
use crate::query::ExportParams;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// Message stored for a row whose save failed for an internal reason.
const ROW_SAVE_FAILED: &str = "Row could not be saved";

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// POST /api/csv/import/subjects
///
/// Columns: `subject_code, class, room, subject_name, work_type, teacher1,
/// teacher2, teacher3`. Upserts the subject by code and the class by label.
pub async fn import_subjects(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (filename, data) = read_csv_upload(multipart, state.config.max_upload_bytes).await?;
    let parsed = parse_subject_rows(&data)?;

    let mut result = ImportResult::new(parsed.total_rows);
    for rejected in parsed.rejected {
        result.record_error(rejected);
    }

    for row in parsed.rows {
        match TransferRepo::apply_subject_row(&state.pool, &row).await {
            Ok(()) => result.record_success(),
            Err(e) => {
                tracing::error!(line = row.line, error = %e, "Subject import row failed");
                result.record_error(ImportErrorRow {
                    row: row.line,
                    error: ROW_SAVE_FAILED.to_string(),
                    data: row.raw,
                });
            }
        }
    }

    tracing::info!(
        file = %filename,
        total = result.total_rows,
        processed = result.processed_rows,
        failed = result.error_rows.len(),
        user_id = admin.user_id,
        "Subject CSV imported",
    );

    Ok(Json(ApiResponse::with_message(
        result.finish(),
        "Subject import finished",
    )))
}

/// POST /api/csv/import/timetables
///
/// One row per class: `class` followed by `mon1` .. `fri4`. Each imported
/// row replaces the class's whole week atomically.
pub async fn import_timetables(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (filename, data) = read_csv_upload(multipart, state.config.max_upload_bytes).await?;
    let parsed = parse_timetable_rows(&data)?;

    let mut result = ImportResult::new(parsed.total_rows);
    for rejected in parsed.rejected {
        result.record_error(rejected);
    }

    for row in parsed.rows {
        match TransferRepo::replace_class_timetable(&state.pool, &row).await {
            Ok(lessons) => {
                tracing::debug!(line = row.line, lessons, "Class week replaced");
                result.record_success();
            }
            Err(RowFailure::Rejected(msg)) => {
                result.record_error(ImportErrorRow {
                    row: row.line,
                    error: msg,
                    data: row.raw,
                });
            }
            Err(RowFailure::Database(e)) => {
                tracing::error!(line = row.line, error = %e, "Timetable import row failed");
                result.record_error(ImportErrorRow {
                    row: row.line,
                    error: ROW_SAVE_FAILED.to_string(),
                    data: row.raw,
                });
            }
        }
    }

    tracing::info!(
        file = %filename,
        total = result.total_rows,
        processed = result.processed_rows,
        failed = result.error_rows.len(),
        user_id = admin.user_id,
        "Timetable CSV imported",
    );

    Ok(Json(ApiResponse::with_message(
        result.finish(),
        "Timetable import finished",
    )))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// GET /api/csv/export/timetables?grade=&class_id=
///
/// One row per class with 20 day/period cells in `subject | teacher email
/// [| room]` form, so the file can be imported again unchanged.
pub async fn export_timetables(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let classes = TransferRepo::class_timetables(&state.pool, params.grade, params.class_id).await?;
    let slots = timetable_slots();

    let rows: Vec<Vec<String>> = classes
        .iter()
        .map(|week| {
            let mut row = Vec::with_capacity(slots.len() + 1);
            row.push(format_class_label(week.class.grade, &week.class.class_name));
            row.extend(slots.iter().map(|slot| {
                week.entries
                    .iter()
                    .find(|entry| entry.slot() == Some(*slot))
                    .map(|entry| {
                        format_cell(&entry.subject_name, &entry.teacher_email, entry.room.as_deref())
                    })
                    .unwrap_or_default()
            }));
            row
        })
        .collect();

    let csv = write_csv(timetable_headers(), rows)
        .map_err(|e| AppError::InternalError(format!("CSV export error: {e}")))?;

    tracing::info!(classes = classes.len(), user_id = user.user_id, "Timetables exported");
    Ok(csv_attachment("timetables", csv))
}

/// GET /api/csv/export/subjects?grade=
///
/// One row per scheduled (subject, class) pairing with up to three teachers.
pub async fn export_subjects(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let pairings = TransferRepo::subject_rows(&state.pool, params.grade).await?;

    let rows: Vec<Vec<String>> = pairings
        .iter()
        .map(|p| {
            let mut row = vec![
                p.subject_code.clone(),
                format_class_label(p.grade, &p.class_name),
                p.room.clone().unwrap_or_default(),
                p.subject_name.clone(),
                String::new(),
            ];
            row.extend((0..3).map(|i| p.teachers.get(i).cloned().unwrap_or_default()));
            row
        })
        .collect();

    let csv = write_csv(SUBJECT_HEADERS, rows)
        .map_err(|e| AppError::InternalError(format!("CSV export error: {e}")))?;

    tracing::info!(rows = pairings.len(), user_id = user.user_id, "Subjects exported");
    Ok(csv_attachment("subjects", csv))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pull the `file` field out of a multipart body and check its name and size.
async fn read_csv_upload(
    mut multipart: Multipart,
    max_bytes: usize,
) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !has_csv_extension(&filename) {
            return Err(AppError::BadRequest(format!(
                "File must have a .{CSV_EXTENSION} extension"
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.len() > max_bytes {
            return Err(AppError::BadRequest(format!(
                "File is too large (limit {max_bytes} bytes)"
            )));
        }
        return Ok((filename, data.to_vec()));
    }

    Err(AppError::BadRequest(format!(
        "Missing '{FILE_FIELD}' field in multipart body"
    )))
}

fn csv_attachment(prefix: &str, body: Vec<u8>) -> impl IntoResponse {
    let filename = format!("{prefix}_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}
