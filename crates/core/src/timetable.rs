//! Weekly slot rules: days, periods, class labels and conflict dimensions.
//!
//! A timetable slot is a (day, period) cell in a 5x4 weekly grid. Three
//! uniqueness rules apply to every slot: a class, a teacher and a room can
//! each appear at most once per (day, period).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// First teaching period of the day.
pub const MIN_PERIOD: i16 = 1;

/// Last teaching period of the day.
pub const MAX_PERIOD: i16 = 4;

/// Lowest valid school grade.
pub const MIN_GRADE: i16 = 1;

/// Highest valid school grade.
pub const MAX_GRADE: i16 = 5;

/// Unique constraint guarding (class_id, day_of_week, period).
pub const UQ_CLASS_SLOT: &str = "uq_timetables_class_slot";

/// Unique constraint guarding (teacher_id, day_of_week, period).
pub const UQ_TEACHER_SLOT: &str = "uq_timetables_teacher_slot";

/// Unique constraint guarding (room, day_of_week, period).
pub const UQ_ROOM_SLOT: &str = "uq_timetables_room_slot";

// ---------------------------------------------------------------------------
// Day of week
// ---------------------------------------------------------------------------

/// School day. Stored in the database as its lowercase English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl DayOfWeek {
    /// All school days in weekly order.
    pub const ALL: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    /// Canonical storage name (`"monday"` .. `"friday"`).
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
        }
    }

    /// Three-letter prefix used in tabular column headers (`mon1`, `tue3`, ...).
    pub fn short(self) -> &'static str {
        &self.as_str()[..3]
    }

    /// Parse a day from its full name, three-letter abbreviation, or the
    /// single-kanji form used by legacy timetable files. Case-insensitive.
    pub fn parse(input: &str) -> Result<Self, String> {
        let normalized = input.trim().to_lowercase();
        let day = match normalized.as_str() {
            "monday" | "mon" | "月" => DayOfWeek::Monday,
            "tuesday" | "tue" | "火" => DayOfWeek::Tuesday,
            "wednesday" | "wed" | "水" => DayOfWeek::Wednesday,
            "thursday" | "thu" | "木" => DayOfWeek::Thursday,
            "friday" | "fri" | "金" => DayOfWeek::Friday,
            _ => {
                return Err(format!(
                    "Invalid day '{input}'. Must be one of: monday, tuesday, wednesday, thursday, friday"
                ))
            }
        };
        Ok(day)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a period number is within the school day.
pub fn validate_period(period: i16) -> Result<(), String> {
    if (MIN_PERIOD..=MAX_PERIOD).contains(&period) {
        Ok(())
    } else {
        Err(format!(
            "Period must be between {MIN_PERIOD} and {MAX_PERIOD}, got {period}"
        ))
    }
}

/// Validate that a grade is within the supported range.
pub fn validate_grade(grade: i16) -> Result<(), String> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(format!(
            "Grade must be between {MIN_GRADE} and {MAX_GRADE}, got {grade}"
        ))
    }
}

// ---------------------------------------------------------------------------
// Class labels
// ---------------------------------------------------------------------------

/// A class identified by its natural key, as written in tabular files (`"2-B"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    pub grade: i16,
    pub class_name: String,
}

/// Parse a `"grade-name"` class label. The grade must be within 1..=5 and the
/// name must be non-empty.
pub fn parse_class_label(label: &str) -> Result<ClassLabel, String> {
    let label = label.trim();
    if label.is_empty() {
        return Err("Class is required".to_string());
    }

    let (grade_part, name_part) = label
        .split_once('-')
        .ok_or_else(|| format!("Invalid class label '{label}' (expected e.g. 1-A)"))?;

    let grade: i16 = grade_part
        .trim()
        .parse()
        .map_err(|_| format!("Invalid grade in class label '{label}'"))?;
    validate_grade(grade)?;

    let class_name = name_part.trim();
    if class_name.is_empty() || class_name.contains('-') {
        return Err(format!("Invalid class label '{label}' (expected e.g. 1-A)"));
    }

    Ok(ClassLabel {
        grade,
        class_name: class_name.to_string(),
    })
}

/// Format a class as its `"grade-name"` label.
pub fn format_class_label(grade: i16, class_name: &str) -> String {
    format!("{grade}-{class_name}")
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// The dimension on which a proposed slot clashes with an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictDimension {
    Class,
    Teacher,
    Room,
}

impl ConflictDimension {
    /// Map a storage-level unique constraint name to the dimension it guards.
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            UQ_CLASS_SLOT => Some(ConflictDimension::Class),
            UQ_TEACHER_SLOT => Some(ConflictDimension::Teacher),
            UQ_ROOM_SLOT => Some(ConflictDimension::Room),
            _ => None,
        }
    }

    /// Human-readable conflict message for a (day, period) clash.
    pub fn message(self, day: DayOfWeek, period: i16) -> String {
        format!("{self} is already scheduled on {day} period {period}")
    }
}

impl fmt::Display for ConflictDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictDimension::Class => "Class",
            ConflictDimension::Teacher => "Teacher",
            ConflictDimension::Room => "Room",
        })
    }
}

/// The values that participate in the three uniqueness rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKey {
    pub class_id: DbId,
    pub teacher_id: DbId,
    pub day: DayOfWeek,
    pub period: i16,
    /// Rooms are optional; an absent room never clashes.
    pub room: Option<String>,
}

// ---------------------------------------------------------------------------
// Weekly grid
// ---------------------------------------------------------------------------

/// Day -> period -> entry. Every school day is present; periods with no
/// entry are absent from the inner map.
pub type WeeklyGrid<T> = BTreeMap<DayOfWeek, BTreeMap<i16, T>>;

/// Bucket entries into a weekly grid using `slot_of` to locate each one.
///
/// Entries whose day cannot be determined are skipped. If two entries share a
/// slot the later one wins, which cannot happen while the uniqueness rules hold.
pub fn build_weekly_grid<T, F>(entries: Vec<T>, slot_of: F) -> WeeklyGrid<T>
where
    F: Fn(&T) -> Option<(DayOfWeek, i16)>,
{
    let mut grid: WeeklyGrid<T> = DayOfWeek::ALL
        .iter()
        .map(|day| (*day, BTreeMap::new()))
        .collect();

    for entry in entries {
        if let Some((day, period)) = slot_of(&entry) {
            grid.entry(day).or_default().insert(period, entry);
        }
    }

    grid
}
