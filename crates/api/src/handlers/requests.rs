//! Handlers for the `/requests` resource (timetable change requests).
//!
//! Teachers file and edit their own requests; admins see every request and
//! decide on them. A decision is only possible while the request is pending.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use timetable_core::change_request::{
    ensure_editable, validate_status, validate_transition, ReviewDecision,
};
use timetable_core::error::CoreError;
use timetable_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use timetable_core::types::DbId;
use timetable_db::models::change_request::{
    ChangeRequest, ChangeRequestDetail, ChangeRequestFilter, ChangeRequestReview,
    CreateChangeRequest, ReviewChangeRequest, UpdateChangeRequest,
};
use timetable_db::repositories::change_request_repo::DecisionOutcome;
use timetable_db::repositories::ChangeRequestRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireTeacher};
use crate::response::{ApiResponse, Page};
use crate::state::AppState;
use crate::validation::validate_request;

/// A change request with its review history.
#[derive(Debug, Serialize)]
pub struct ChangeRequestWithReviews {
    #[serde(flatten)]
    pub request: ChangeRequestDetail,
    pub reviews: Vec<ChangeRequestReview>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/requests?status=&requester_id=&from=&to=&limit=&offset=
///
/// Non-admins only ever see their own requests; `requester_id` is forced to
/// the caller.
pub async fn list_requests(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Query(mut filter): Query<ChangeRequestFilter>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = filter.status.as_deref() {
        validate_status(status)?;
    }
    if !user.is_admin() {
        filter.requester_id = Some(user.user_id);
    }
    let limit = clamp_limit(filter.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(filter.offset);

    let items = ChangeRequestRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ChangeRequestRepo::count(&state.pool, &filter).await?;

    Ok(Json(ApiResponse::ok(Page {
        items,
        total,
        limit,
        offset,
    })))
}

/// GET /api/requests/{id}
pub async fn get_request(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = ChangeRequestRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    ensure_owner(&user, request.requester_id)?;

    let reviews = ChangeRequestRepo::list_reviews(&state.pool, id).await?;

    Ok(Json(ApiResponse::ok(ChangeRequestWithReviews {
        request,
        reviews,
    })))
}

// ---------------------------------------------------------------------------
// Writes by the requester
// ---------------------------------------------------------------------------

/// POST /api/requests
///
/// New requests always start out `pending`.
pub async fn create_request(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Json(mut input): Json<CreateChangeRequest>,
) -> AppResult<impl IntoResponse> {
    input.title = input.title.trim().to_string();
    validate_request(&input)?;

    let request = ChangeRequestRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(
        request_id = request.id,
        requester_id = user.user_id,
        "Change request created",
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(request))))
}

/// PUT /api/requests/{id}
///
/// Edits title, description and payload while the request is pending.
pub async fn update_request(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateChangeRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = input.title.as_mut() {
        *title = title.trim().to_string();
    }
    validate_request(&input)?;

    let existing = find_request(&state, id).await?;
    ensure_owner(&user, existing.requester_id)?;
    ensure_editable(&existing.status)?;

    // The UPDATE is guarded by status, so a decision that lands between the
    // read above and this write still wins.
    let request = match ChangeRequestRepo::update_pending(&state.pool, id, &input).await? {
        Some(request) => request,
        None => {
            let current = find_request(&state, id).await?;
            ensure_editable(&current.status)?;
            return Err(AppError::InternalError(format!(
                "Change request {id} could not be updated"
            )));
        }
    };

    tracing::info!(request_id = id, user_id = user.user_id, "Change request updated");

    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/requests/{id}/cancel
///
/// Withdraws a pending request. The requester or an admin may cancel.
pub async fn cancel_request(
    RequireTeacher(user): RequireTeacher,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let review = parse_review(&body)?;

    let existing = find_request(&state, id).await?;
    ensure_owner(&user, existing.requester_id)?;

    let request = decide(&state, &user, id, ReviewDecision::Cancel, &review).await?;
    Ok(Json(ApiResponse::with_message(
        request,
        "Change request canceled",
    )))
}

// ---------------------------------------------------------------------------
// Admin decisions
// ---------------------------------------------------------------------------

/// POST /api/requests/{id}/approve
///
/// Body is optional: `{ "comment": "..." }`.
pub async fn approve_request(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let review = parse_review(&body)?;
    let request = decide(&state, &admin, id, ReviewDecision::Approve, &review).await?;
    Ok(Json(ApiResponse::with_message(
        request,
        "Change request approved",
    )))
}

/// POST /api/requests/{id}/reject
///
/// Body is optional: `{ "comment": "..." }`.
pub async fn reject_request(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let review = parse_review(&body)?;
    let request = decide(&state, &admin, id, ReviewDecision::Reject, &review).await?;
    Ok(Json(ApiResponse::with_message(
        request,
        "Change request rejected",
    )))
}

/// DELETE /api/requests/{id}
///
/// Removes the request and its review history.
pub async fn delete_request(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ChangeRequestRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(request_id = id, user_id = admin.user_id, "Change request deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ChangeRequest",
        id,
    })
}

async fn find_request(state: &AppState, id: DbId) -> AppResult<ChangeRequest> {
    ChangeRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))
}

/// Non-admins may only touch requests they filed.
fn ensure_owner(user: &AuthUser, requester_id: DbId) -> AppResult<()> {
    if user.is_admin() || user.user_id == requester_id {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You can only access your own change requests".into(),
        )))
    }
}

/// An empty body means "no comment".
fn parse_review(body: &[u8]) -> AppResult<ReviewChangeRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReviewChangeRequest::default());
    }
    let review: ReviewChangeRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid review body: {e}")))?;
    validate_request(&review)?;
    Ok(review)
}

/// Apply a decision and translate the outcome into a response or error.
async fn decide(
    state: &AppState,
    reviewer: &AuthUser,
    id: DbId,
    decision: ReviewDecision,
    review: &ReviewChangeRequest,
) -> AppResult<ChangeRequest> {
    let outcome = ChangeRequestRepo::apply_decision(
        &state.pool,
        id,
        reviewer.user_id,
        decision,
        review.comment.as_deref(),
    )
    .await?;

    match outcome {
        DecisionOutcome::Applied(request) => {
            tracing::info!(
                request_id = id,
                reviewer_id = reviewer.user_id,
                status = %request.status,
                "Change request decided",
            );
            Ok(request)
        }
        DecisionOutcome::NotFound => Err(not_found(id)),
        DecisionOutcome::NotPending(status) => {
            validate_transition(&status, decision.target_status())?;
            Err(AppError::InternalError(format!(
                "Change request {id} is {status} but the decision was not applied"
            )))
        }
    }
}
