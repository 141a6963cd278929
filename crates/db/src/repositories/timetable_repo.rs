//! Repository for the `timetables` table.

use sqlx::PgPool;
use timetable_core::timetable::ConflictDimension;
use timetable_core::types::DbId;

use crate::models::timetable::{TimetableDetail, TimetableEntry, TimetableFilter, TimetableValues};

const COLUMNS: &str =
    "id, class_id, subject_id, teacher_id, day_of_week, period, room, created_at, updated_at";

/// Joined projection used by list / detail / weekly queries.
const DETAIL_SELECT: &str = "SELECT t.id, t.class_id, t.subject_id, t.teacher_id, \
        t.day_of_week, t.period, t.room, \
        c.grade, c.class_name, \
        s.code AS subject_code, s.name AS subject_name, \
        u.name AS teacher_name, u.email AS teacher_email, \
        t.created_at, t.updated_at \
    FROM timetables t \
    JOIN classes c ON c.id = t.class_id \
    JOIN subjects s ON s.id = t.subject_id \
    JOIN users u ON u.id = t.teacher_id";

/// Sort key placing days in weekly rather than alphabetical order.
pub(crate) const DAY_ORDER: &str = "array_position(\
    ARRAY['monday','tuesday','wednesday','thursday','friday']::TEXT[], t.day_of_week)";

/// Provides CRUD operations and slot conflict detection for timetable entries.
pub struct TimetableRepo;

impl TimetableRepo {
    /// Insert an entry. A concurrent writer that claimed the same slot first
    /// makes this fail with a unique violation on one of the slot constraints.
    pub async fn create(
        pool: &PgPool,
        values: &TimetableValues,
    ) -> Result<TimetableEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO timetables (class_id, subject_id, teacher_id, day_of_week, period, room)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimetableEntry>(&query)
            .bind(values.class_id)
            .bind(values.subject_id)
            .bind(values.teacher_id)
            .bind(values.day.as_str())
            .bind(values.period)
            .bind(&values.room)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TimetableEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM timetables WHERE id = $1");
        sqlx::query_as::<_, TimetableEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an entry with its class, subject and teacher display fields.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TimetableDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, TimetableDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List entries ordered by grade, class name, day and period.
    ///
    /// `filter.day_of_week` must already be in canonical (lowercase) form.
    pub async fn list(
        pool: &PgPool,
        filter: &TimetableFilter,
    ) -> Result<Vec<TimetableDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE ($1::SMALLINT IS NULL OR c.grade = $1)
               AND ($2::BIGINT IS NULL OR t.class_id = $2)
               AND ($3::TEXT IS NULL OR c.class_name = $3)
               AND ($4::TEXT IS NULL OR t.day_of_week = $4)
               AND ($5::BIGINT IS NULL OR t.teacher_id = $5)
             ORDER BY c.grade, c.class_name, {DAY_ORDER}, t.period"
        );
        sqlx::query_as::<_, TimetableDetail>(&query)
            .bind(filter.grade)
            .bind(filter.class_id)
            .bind(&filter.class_name)
            .bind(&filter.day_of_week)
            .bind(filter.teacher_id)
            .fetch_all(pool)
            .await
    }

    /// Find which dimension, if any, of the proposed slot is already taken.
    ///
    /// The entry `exclude_id` is ignored so an update never clashes with
    /// itself. Class is reported before teacher, teacher before room. Entries
    /// without a room never clash on room.
    pub async fn find_conflict(
        pool: &PgPool,
        values: &TimetableValues,
        exclude_id: Option<DbId>,
    ) -> Result<Option<ConflictDimension>, sqlx::Error> {
        let (class_taken, teacher_taken, room_taken): (bool, bool, bool) = sqlx::query_as(
            "SELECT
                EXISTS (SELECT 1 FROM timetables
                        WHERE class_id = $1 AND day_of_week = $4 AND period = $5
                          AND ($6::BIGINT IS NULL OR id <> $6)),
                EXISTS (SELECT 1 FROM timetables
                        WHERE teacher_id = $2 AND day_of_week = $4 AND period = $5
                          AND ($6::BIGINT IS NULL OR id <> $6)),
                ($3::TEXT IS NOT NULL AND EXISTS (
                        SELECT 1 FROM timetables
                        WHERE room = $3 AND day_of_week = $4 AND period = $5
                          AND ($6::BIGINT IS NULL OR id <> $6)))",
        )
        .bind(values.class_id)
        .bind(values.teacher_id)
        .bind(&values.room)
        .bind(values.day.as_str())
        .bind(values.period)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(if class_taken {
            Some(ConflictDimension::Class)
        } else if teacher_taken {
            Some(ConflictDimension::Teacher)
        } else if room_taken {
            Some(ConflictDimension::Room)
        } else {
            None
        })
    }

    /// Overwrite every column of an entry with fully merged values.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        values: &TimetableValues,
    ) -> Result<Option<TimetableEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE timetables SET
                class_id = $2,
                subject_id = $3,
                teacher_id = $4,
                day_of_week = $5,
                period = $6,
                room = $7
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimetableEntry>(&query)
            .bind(id)
            .bind(values.class_id)
            .bind(values.subject_id)
            .bind(values.teacher_id)
            .bind(values.day.as_str())
            .bind(values.period)
            .bind(&values.room)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM timetables WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
