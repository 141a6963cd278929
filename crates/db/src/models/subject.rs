//! Subject entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use timetable_core::types::{DbId, Timestamp};
use validator::Validate;

use super::double_option;

/// A row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub category: String,
    /// Canonical term slug: `first_half`, `second_half` or `full_year`.
    pub term: String,
    pub credits: i32,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a subject. `term` must already be normalized.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubject {
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub category: String,
    pub term: String,
    /// Defaults to 1 when omitted.
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub credits: Option<i32>,
    pub description: Option<String>,
}

/// DTO for updating a subject. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSubject {
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub category: Option<String>,
    pub term: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub credits: Option<i32>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Query filter for listing subjects.
#[derive(Debug, Default, Deserialize)]
pub struct SubjectFilter {
    pub category: Option<String>,
    pub term: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
