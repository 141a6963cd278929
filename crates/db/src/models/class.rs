//! Class (homeroom) entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use timetable_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `classes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SchoolClass {
    pub id: DbId,
    pub grade: i16,
    pub class_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a class.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClass {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub grade: i16,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub class_name: String,
}

/// DTO for updating a class. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClass {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub grade: Option<i16>,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub class_name: Option<String>,
}

/// Query filter for listing classes.
#[derive(Debug, Default, Deserialize)]
pub struct ClassFilter {
    pub grade: Option<i16>,
}
