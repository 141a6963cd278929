//! Timetable entry model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use timetable_core::timetable::DayOfWeek;
use timetable_core::types::{DbId, Timestamp};
use validator::Validate;

use super::double_option;

/// A row from the `timetables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimetableEntry {
    pub id: DbId,
    pub class_id: DbId,
    pub subject_id: DbId,
    pub teacher_id: DbId,
    pub day_of_week: String,
    pub period: i16,
    pub room: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A timetable entry joined with its class, subject and teacher display fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimetableDetail {
    pub id: DbId,
    pub class_id: DbId,
    pub subject_id: DbId,
    pub teacher_id: DbId,
    pub day_of_week: String,
    pub period: i16,
    pub room: Option<String>,
    pub grade: i16,
    pub class_name: String,
    pub subject_code: String,
    pub subject_name: String,
    pub teacher_name: String,
    pub teacher_email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TimetableDetail {
    /// The (day, period) cell this entry occupies, if the stored day is valid.
    pub fn slot(&self) -> Option<(DayOfWeek, i16)> {
        DayOfWeek::parse(&self.day_of_week)
            .ok()
            .map(|day| (day, self.period))
    }
}

/// DTO for creating an entry. `day_of_week` accepts any spelling
/// [`DayOfWeek::parse`] understands.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimetableEntry {
    pub class_id: DbId,
    pub subject_id: DbId,
    pub teacher_id: DbId,
    pub day_of_week: String,
    #[validate(range(min = 1, max = 4, message = "must be between 1 and 4"))]
    pub period: i16,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub room: Option<String>,
}

/// DTO for updating an entry. Absent fields are left unchanged; `room: null`
/// clears the room.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTimetableEntry {
    pub class_id: Option<DbId>,
    pub subject_id: Option<DbId>,
    pub teacher_id: Option<DbId>,
    pub day_of_week: Option<String>,
    #[validate(range(min = 1, max = 4, message = "must be between 1 and 4"))]
    pub period: Option<i16>,
    #[serde(default, deserialize_with = "double_option")]
    pub room: Option<Option<String>>,
}

/// Fully resolved values written by an insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableValues {
    pub class_id: DbId,
    pub subject_id: DbId,
    pub teacher_id: DbId,
    pub day: DayOfWeek,
    pub period: i16,
    pub room: Option<String>,
}

impl TimetableValues {
    /// Apply a patch on top of an existing entry's values.
    pub fn merged(existing: &TimetableEntry, day: DayOfWeek, patch: &UpdateTimetableEntry) -> Self {
        Self {
            class_id: patch.class_id.unwrap_or(existing.class_id),
            subject_id: patch.subject_id.unwrap_or(existing.subject_id),
            teacher_id: patch.teacher_id.unwrap_or(existing.teacher_id),
            day,
            period: patch.period.unwrap_or(existing.period),
            room: match &patch.room {
                Some(room) => normalize_room(room.as_deref()),
                None => existing.room.clone(),
            },
        }
    }
}

/// Blank rooms are stored as NULL.
pub fn normalize_room(room: Option<&str>) -> Option<String> {
    room.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Query filter for listing entries.
#[derive(Debug, Default, Deserialize)]
pub struct TimetableFilter {
    pub grade: Option<i16>,
    pub class_id: Option<DbId>,
    pub class_name: Option<String>,
    pub day_of_week: Option<String>,
    pub teacher_id: Option<DbId>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn existing() -> TimetableEntry {
        TimetableEntry {
            id: 1,
            class_id: 10,
            subject_id: 20,
            teacher_id: 30,
            day_of_week: "monday".into(),
            period: 1,
            room: Some("R1".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let patch = UpdateTimetableEntry {
            period: Some(3),
            ..Default::default()
        };
        let merged = TimetableValues::merged(&existing(), DayOfWeek::Monday, &patch);
        assert_eq!(merged.class_id, 10);
        assert_eq!(merged.period, 3);
        assert_eq!(merged.room.as_deref(), Some("R1"));
    }

    #[test]
    fn merge_can_clear_room() {
        let patch = UpdateTimetableEntry {
            room: Some(None),
            ..Default::default()
        };
        let merged = TimetableValues::merged(&existing(), DayOfWeek::Monday, &patch);
        assert_eq!(merged.room, None);
    }

    #[test]
    fn blank_room_is_none() {
        assert_eq!(normalize_room(Some("  ")), None);
        assert_eq!(normalize_room(Some(" R2 ")).as_deref(), Some("R2"));
    }
}
