//! Change request models, review audit rows and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use timetable_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `change_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub title: String,
    pub description: String,
    pub request_data: serde_json::Value,
    pub status: String,
    pub approver_id: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A change request with requester and approver names resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeRequestDetail {
    pub id: DbId,
    pub requester_id: DbId,
    pub requester_name: String,
    pub title: String,
    pub description: String,
    pub request_data: serde_json::Value,
    pub status: String,
    pub approver_id: Option<DbId>,
    pub approver_name: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from `change_request_reviews`, joined with the reviewer's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeRequestReview {
    pub id: DbId,
    pub change_request_id: DbId,
    pub reviewer_id: DbId,
    pub reviewer_name: String,
    pub decision: String,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a change request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChangeRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    /// Opaque description of the proposed change. Defaults to `{}`.
    pub request_data: Option<serde_json::Value>,
}

/// DTO for editing a pending change request. Status is never changed here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateChangeRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub request_data: Option<serde_json::Value>,
}

/// Body for approve / reject / cancel.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewChangeRequest {
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Query filter for listing change requests.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeRequestFilter {
    pub requester_id: Option<DbId>,
    pub status: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<Timestamp>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
