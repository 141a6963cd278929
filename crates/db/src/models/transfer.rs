//! Read models backing CSV export.

use serde::Serialize;
use sqlx::FromRow;

use super::class::SchoolClass;
use super::timetable::TimetableDetail;

/// A class together with every lesson scheduled for it.
#[derive(Debug, Clone, Serialize)]
pub struct ClassTimetable {
    pub class: SchoolClass,
    pub entries: Vec<TimetableDetail>,
}

/// One scheduled (subject, class) pairing with its teachers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubjectExportRow {
    pub subject_code: String,
    pub grade: i16,
    pub class_name: String,
    pub room: Option<String>,
    pub subject_name: String,
    /// Distinct teacher names, alphabetical.
    pub teachers: Vec<String>,
}
