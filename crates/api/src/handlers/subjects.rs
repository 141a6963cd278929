//! Handlers for the `/subjects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use timetable_core::error::CoreError;
use timetable_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use timetable_core::subject::{normalize_term, validate_code};
use timetable_core::types::DbId;
use timetable_db::models::subject::{CreateSubject, SubjectFilter, UpdateSubject};
use timetable_db::repositories::SubjectRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::{ApiResponse, Page};
use crate::state::AppState;
use crate::validation::validate_request;

/// GET /api/subjects?category=&term=&limit=&offset=
///
/// `total` counts every matching subject, not just the returned page.
pub async fn list_subjects(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(mut filter): Query<SubjectFilter>,
) -> AppResult<impl IntoResponse> {
    if let Some(term) = filter.term.as_deref() {
        filter.term = Some(normalize_term(term)?.to_string());
    }
    let limit = clamp_limit(filter.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(filter.offset);

    let items = SubjectRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = SubjectRepo::count(&state.pool, &filter).await?;

    Ok(Json(ApiResponse::ok(Page {
        items,
        total,
        limit,
        offset,
    })))
}

/// GET /api/subjects/{id}
pub async fn get_subject(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let subject = SubjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id,
        }))?;

    Ok(Json(ApiResponse::ok(subject)))
}

/// POST /api/subjects
///
/// `term` accepts `first-half`, `first_half` and similar spellings; it is
/// stored in canonical form.
pub async fn create_subject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateSubject>,
) -> AppResult<impl IntoResponse> {
    input.code = input.code.trim().to_string();
    input.name = input.name.trim().to_string();
    input.category = input.category.trim().to_string();
    validate_request(&input)?;
    validate_code(&input.code)?;
    input.term = normalize_term(&input.term)?.to_string();

    let subject = SubjectRepo::create(&state.pool, &input).await?;

    tracing::info!(
        subject_id = subject.id,
        code = %subject.code,
        user_id = admin.user_id,
        "Subject created",
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(subject))))
}

/// PUT /api/subjects/{id}
///
/// Only fields present in the body are changed.
pub async fn update_subject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateSubject>,
) -> AppResult<impl IntoResponse> {
    for field in [&mut input.code, &mut input.name, &mut input.category] {
        if let Some(value) = field.as_mut() {
            *value = value.trim().to_string();
        }
    }
    validate_request(&input)?;
    if let Some(code) = input.code.as_deref() {
        validate_code(code)?;
    }
    if let Some(term) = input.term.as_deref() {
        input.term = Some(normalize_term(term)?.to_string());
    }

    let subject = SubjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id,
        }))?;

    tracing::info!(subject_id = id, user_id = admin.user_id, "Subject updated");

    Ok(Json(ApiResponse::ok(subject)))
}

/// DELETE /api/subjects/{id}
///
/// Fails with 409 while the subject is still scheduled.
pub async fn delete_subject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !SubjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Subject",
            id,
        }));
    }

    tracing::info!(subject_id = id, user_id = admin.user_id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}
