//! Handlers for the `/classes` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use timetable_core::error::CoreError;
use timetable_core::types::DbId;
use timetable_db::models::class::{ClassFilter, CreateClass, UpdateClass};
use timetable_db::repositories::ClassRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::validate_request;

/// Class names appear in `grade-name` labels, so they cannot contain `-`.
fn check_class_name(name: &str) -> AppResult<()> {
    if name.contains('-') {
        return Err(AppError::Core(CoreError::Validation(format!(
            "class_name '{name}' must not contain '-'"
        ))));
    }
    Ok(())
}

/// GET /api/classes?grade=
pub async fn list_classes(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<ClassFilter>,
) -> AppResult<impl IntoResponse> {
    let classes = ClassRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::ok(classes)))
}

/// GET /api/classes/{id}
pub async fn get_class(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let class = ClassRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Class",
            id,
        }))?;

    Ok(Json(ApiResponse::ok(class)))
}

/// POST /api/classes
pub async fn create_class(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateClass>,
) -> AppResult<impl IntoResponse> {
    input.class_name = input.class_name.trim().to_string();
    validate_request(&input)?;
    check_class_name(&input.class_name)?;

    let class = ClassRepo::create(&state.pool, &input).await?;

    tracing::info!(
        class_id = class.id,
        grade = class.grade,
        class_name = %class.class_name,
        user_id = admin.user_id,
        "Class created",
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(class))))
}

/// PUT /api/classes/{id}
pub async fn update_class(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateClass>,
) -> AppResult<impl IntoResponse> {
    input.class_name = input.class_name.map(|n| n.trim().to_string());
    validate_request(&input)?;
    if let Some(name) = &input.class_name {
        check_class_name(name)?;
    }

    let class = ClassRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Class",
            id,
        }))?;

    tracing::info!(class_id = id, user_id = admin.user_id, "Class updated");

    Ok(Json(ApiResponse::ok(class)))
}

/// DELETE /api/classes/{id}
///
/// Removes the class's timetable entries with it.
pub async fn delete_class(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ClassRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Class",
            id,
        }));
    }

    tracing::info!(class_id = id, user_id = admin.user_id, "Class deleted");
    Ok(StatusCode::NO_CONTENT)
}
