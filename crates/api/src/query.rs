//! Shared query parameter types for API handlers.

use serde::Deserialize;
use timetable_core::types::DbId;

/// `?role=` filter on the user list.
#[derive(Debug, Default, Deserialize)]
pub struct RoleParams {
    pub role: Option<String>,
}

/// `?grade=&class_id=` filter shared by the export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub grade: Option<i16>,
    pub class_id: Option<DbId>,
}

/// `?class_id=` selector for the student timetable view.
#[derive(Debug, Deserialize)]
pub struct ClassIdParams {
    pub class_id: DbId,
}
