//! Handlers for the `/timetables` resource.
//!
//! Every write runs the slot conflict check first and reports the clashing
//! dimension. The unique constraints on `timetables` catch writers that race
//! past the check; their violations are reported the same way.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use timetable_core::error::CoreError;
use timetable_core::roles::ROLE_STUDENT;
use timetable_core::timetable::{build_weekly_grid, validate_period, DayOfWeek, WeeklyGrid};
use timetable_core::types::DbId;
use timetable_db::models::class::SchoolClass;
use timetable_db::models::timetable::{
    normalize_room, CreateTimetableEntry, TimetableDetail, TimetableFilter, TimetableValues,
    UpdateTimetableEntry,
};
use timetable_db::repositories::{ClassRepo, SubjectRepo, TimetableRepo, UserRepo};

use crate::error::{slot_violation, AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::{check, validate_request};

/// A class and its week laid out as day -> period -> entry.
#[derive(Debug, Serialize)]
pub struct WeeklyTimetable {
    pub class: SchoolClass,
    pub timetable: WeeklyGrid<TimetableDetail>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/timetables?grade=&class_id=&class_name=&day_of_week=&teacher_id=
///
/// Ordered by grade, class name, weekday and period.
pub async fn list_timetables(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(mut filter): Query<TimetableFilter>,
) -> AppResult<impl IntoResponse> {
    if let Some(day) = filter.day_of_week.as_deref() {
        filter.day_of_week = Some(parse_day(day)?.as_str().to_string());
    }

    let entries = TimetableRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/timetables/{id}
pub async fn get_timetable(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = find_detail(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// GET /api/timetables/weekly/{class_id}
///
/// Every weekday is present; empty periods are simply absent.
pub async fn get_weekly(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(class_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let weekly = weekly_timetable(&state.pool, class_id).await?;
    Ok(Json(ApiResponse::ok(weekly)))
}

/// Load a class and bucket its entries into a weekly grid.
pub(crate) async fn weekly_timetable(pool: &PgPool, class_id: DbId) -> AppResult<WeeklyTimetable> {
    let class = ClassRepo::find_by_id(pool, class_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Class",
            id: class_id,
        }))?;

    let filter = TimetableFilter {
        class_id: Some(class_id),
        ..Default::default()
    };
    let entries = TimetableRepo::list(pool, &filter).await?;

    Ok(WeeklyTimetable {
        class,
        timetable: build_weekly_grid(entries, TimetableDetail::slot),
    })
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/timetables
pub async fn create_timetable(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateTimetableEntry>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;

    let values = TimetableValues {
        class_id: input.class_id,
        subject_id: input.subject_id,
        teacher_id: input.teacher_id,
        day: parse_day(&input.day_of_week)?,
        period: input.period,
        room: normalize_room(input.room.as_deref()),
    };
    check(validate_period(values.period))?;
    ensure_references(&state.pool, &values).await?;
    ensure_slot_free(&state.pool, &values, None).await?;

    let entry = TimetableRepo::create(&state.pool, &values)
        .await
        .map_err(|e| conflict_or_db(e, &values))?;

    tracing::info!(
        entry_id = entry.id,
        class_id = entry.class_id,
        teacher_id = entry.teacher_id,
        day = %values.day,
        period = entry.period,
        user_id = admin.user_id,
        "Timetable entry created",
    );

    let detail = find_detail(&state.pool, entry.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(detail))))
}

/// PUT /api/timetables/{id}
///
/// Fields absent from the body keep their current value; `room: null`
/// clears the room. The entry never conflicts with itself.
pub async fn update_timetable(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTimetableEntry>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;

    let existing = TimetableRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TimetableEntry",
            id,
        }))?;

    let day = match input.day_of_week.as_deref() {
        Some(day) => parse_day(day)?,
        None => parse_day(&existing.day_of_week)?,
    };
    let values = TimetableValues::merged(&existing, day, &input);
    check(validate_period(values.period))?;
    ensure_references(&state.pool, &values).await?;
    ensure_slot_free(&state.pool, &values, Some(id)).await?;

    TimetableRepo::update(&state.pool, id, &values)
        .await
        .map_err(|e| conflict_or_db(e, &values))?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TimetableEntry",
            id,
        }))?;

    tracing::info!(entry_id = id, user_id = admin.user_id, "Timetable entry updated");

    let detail = find_detail(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// DELETE /api/timetables/{id}
pub async fn delete_timetable(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TimetableRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "TimetableEntry",
            id,
        }));
    }

    tracing::info!(entry_id = id, user_id = admin.user_id, "Timetable entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_day(day: &str) -> AppResult<DayOfWeek> {
    DayOfWeek::parse(day).map_err(|msg| AppError::Core(CoreError::Validation(msg)))
}

async fn find_detail(pool: &PgPool, id: DbId) -> AppResult<TimetableDetail> {
    TimetableRepo::find_detail(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TimetableEntry",
            id,
        }))
}

/// The class, subject and teacher must exist, and the teacher must not be a
/// student account.
async fn ensure_references(pool: &PgPool, values: &TimetableValues) -> AppResult<()> {
    if ClassRepo::find_by_id(pool, values.class_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Class",
            id: values.class_id,
        }));
    }
    if SubjectRepo::find_by_id(pool, values.subject_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id: values.subject_id,
        }));
    }

    let teacher = UserRepo::find_by_id(pool, values.teacher_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: values.teacher_id,
        }))?;
    if teacher.role == ROLE_STUDENT {
        return Err(AppError::Core(CoreError::Validation(format!(
            "User {} is a student and cannot teach a lesson",
            teacher.id
        ))));
    }
    Ok(())
}

async fn ensure_slot_free(
    pool: &PgPool,
    values: &TimetableValues,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    match TimetableRepo::find_conflict(pool, values, exclude_id).await? {
        Some(dimension) => Err(AppError::Core(CoreError::Conflict(
            dimension.message(values.day, values.period),
        ))),
        None => Ok(()),
    }
}

/// Report a slot unique violation exactly like a failed conflict check.
fn conflict_or_db(err: sqlx::Error, values: &TimetableValues) -> AppError {
    match slot_violation(&err) {
        Some(dimension) => {
            tracing::debug!(%dimension, "Slot claimed by a concurrent writer");
            AppError::Core(CoreError::Conflict(
                dimension.message(values.day, values.period),
            ))
        }
        None => AppError::Database(err),
    }
}
