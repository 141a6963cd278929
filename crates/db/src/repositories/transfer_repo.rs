//! Database side of CSV bulk import and export.
//!
//! Every imported row is applied in its own transaction: a row either lands
//! completely or leaves the database untouched.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use timetable_core::roles::ROLE_STUDENT;
use timetable_core::subject::{generate_auto_code, IMPORTED_CATEGORY, TERM_FULL_YEAR};
use timetable_core::timetable::{ClassLabel, ConflictDimension};
use timetable_core::transfer::{SubjectRow, TimetableRow};
use timetable_core::types::DbId;

use crate::models::class::{ClassFilter, SchoolClass};
use crate::models::timetable::{TimetableDetail, TimetableFilter};
use crate::models::transfer::{ClassTimetable, SubjectExportRow};
use crate::repositories::{ClassRepo, TimetableRepo};

/// Why a single import row was not applied.
#[derive(Debug, thiserror::Error)]
pub enum RowFailure {
    /// The row refers to something that does not exist or clashes with
    /// existing data. Reported back to the uploader.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RowFailure {
    /// Convert a slot unique violation into a row-level rejection.
    fn from_insert(err: sqlx::Error, slot: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(dimension) = db_err.constraint().and_then(ConflictDimension::from_constraint)
            {
                return RowFailure::Rejected(format!(
                    "{slot}: {dimension} is already scheduled in this slot"
                ));
            }
        }
        RowFailure::Database(err)
    }
}

/// Provides the transactional upserts used by CSV import, and export reads.
pub struct TransferRepo;

impl TransferRepo {
    /// Upsert the subject (by code) and class (by grade + name) of one subject row.
    pub async fn apply_subject_row(pool: &PgPool, row: &SubjectRow) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO subjects (code, name, category, term, credits)
             VALUES ($1, $2, $3, $4, 1)
             ON CONFLICT ON CONSTRAINT uq_subjects_code
             DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(&row.subject_code)
        .bind(&row.subject_name)
        .bind(IMPORTED_CATEGORY)
        .bind(TERM_FULL_YEAR)
        .execute(&mut *tx)
        .await?;

        upsert_class(&mut tx, &row.class).await?;

        tx.commit().await
    }

    /// Replace a class's whole week with the lessons of one timetable row.
    ///
    /// Teachers are resolved by email and must exist; unknown subjects are
    /// created with a generated code. Returns the number of lessons written.
    pub async fn replace_class_timetable(
        pool: &PgPool,
        row: &TimetableRow,
    ) -> Result<usize, RowFailure> {
        let mut tx = pool.begin().await?;

        let class_id = upsert_class(&mut tx, &row.class).await?;

        let mut teachers: HashMap<&str, DbId> = HashMap::new();
        let mut subjects: HashMap<&str, DbId> = HashMap::new();
        let mut resolved = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let slot = format!("{}{}", cell.day.short(), cell.period);

            let teacher_id = match teachers.get(cell.teacher_email.as_str()) {
                Some(id) => *id,
                None => {
                    let id = find_teacher(&mut tx, &cell.teacher_email).await?.ok_or_else(|| {
                        RowFailure::Rejected(format!(
                            "{slot}: no teacher with email '{}'",
                            cell.teacher_email
                        ))
                    })?;
                    teachers.insert(&cell.teacher_email, id);
                    id
                }
            };

            let subject_id = match subjects.get(cell.subject_name.as_str()) {
                Some(id) => *id,
                None => {
                    let id = find_or_create_subject(&mut tx, &cell.subject_name).await?;
                    subjects.insert(&cell.subject_name, id);
                    id
                }
            };

            resolved.push((slot, cell, teacher_id, subject_id));
        }

        sqlx::query("DELETE FROM timetables WHERE class_id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await?;

        for (slot, cell, teacher_id, subject_id) in &resolved {
            sqlx::query(
                "INSERT INTO timetables (class_id, subject_id, teacher_id, day_of_week, period, room)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(class_id)
            .bind(subject_id)
            .bind(teacher_id)
            .bind(cell.day.as_str())
            .bind(cell.period)
            .bind(&cell.room)
            .execute(&mut *tx)
            .await
            .map_err(|e| RowFailure::from_insert(e, slot))?;
        }

        tx.commit().await?;
        Ok(resolved.len())
    }

    /// Classes (optionally filtered) with their lessons, ordered by grade and name.
    pub async fn class_timetables(
        pool: &PgPool,
        grade: Option<i16>,
        class_id: Option<DbId>,
    ) -> Result<Vec<ClassTimetable>, sqlx::Error> {
        let classes: Vec<SchoolClass> = ClassRepo::list(pool, &ClassFilter { grade })
            .await?
            .into_iter()
            .filter(|c| class_id.map_or(true, |id| c.id == id))
            .collect();

        let filter = TimetableFilter {
            grade,
            class_id,
            ..Default::default()
        };
        let mut by_class: HashMap<DbId, Vec<TimetableDetail>> = HashMap::new();
        for entry in TimetableRepo::list(pool, &filter).await? {
            by_class.entry(entry.class_id).or_default().push(entry);
        }

        Ok(classes
            .into_iter()
            .map(|class| ClassTimetable {
                entries: by_class.remove(&class.id).unwrap_or_default(),
                class,
            })
            .collect())
    }

    /// Every scheduled (subject, class) pairing, ordered by subject code then class.
    pub async fn subject_rows(
        pool: &PgPool,
        grade: Option<i16>,
    ) -> Result<Vec<SubjectExportRow>, sqlx::Error> {
        sqlx::query_as::<_, SubjectExportRow>(
            "SELECT s.code AS subject_code, c.grade, c.class_name,
                    MIN(t.room) AS room, s.name AS subject_name,
                    array_agg(DISTINCT u.name ORDER BY u.name) AS teachers
             FROM timetables t
             JOIN subjects s ON s.id = t.subject_id
             JOIN classes c ON c.id = t.class_id
             JOIN users u ON u.id = t.teacher_id
             WHERE ($1::SMALLINT IS NULL OR c.grade = $1)
             GROUP BY s.id, s.code, s.name, c.id, c.grade, c.class_name
             ORDER BY s.code, c.grade, c.class_name",
        )
        .bind(grade)
        .fetch_all(pool)
        .await
    }
}

/// Insert the class if missing and return its id.
async fn upsert_class(
    tx: &mut Transaction<'_, Postgres>,
    class: &ClassLabel,
) -> Result<DbId, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO classes (grade, class_name)
         VALUES ($1, $2)
         ON CONFLICT ON CONSTRAINT uq_classes_grade_name
         DO UPDATE SET class_name = EXCLUDED.class_name
         RETURNING id",
    )
    .bind(class.grade)
    .bind(&class.class_name)
    .fetch_one(&mut **tx)
    .await
}

/// Look up a non-student user by email, ignoring case.
async fn find_teacher(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<Option<DbId>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM users WHERE email = lower(btrim($1)) AND role <> $2")
        .bind(email)
        .bind(ROLE_STUDENT)
        .fetch_optional(&mut **tx)
        .await
}

/// Resolve a subject by exact name, creating it with a generated code if unseen.
async fn find_or_create_subject(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<DbId, sqlx::Error> {
    let existing: Option<DbId> =
        sqlx::query_scalar("SELECT id FROM subjects WHERE name = $1 ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    tracing::info!(subject = %name, "Creating subject referenced by timetable import");
    sqlx::query_scalar(
        "INSERT INTO subjects (code, name, category, term, credits)
         VALUES ($1, $2, $3, $4, 1)
         RETURNING id",
    )
    .bind(generate_auto_code())
    .bind(name)
    .bind(IMPORTED_CATEGORY)
    .bind(TERM_FULL_YEAR)
    .fetch_one(&mut **tx)
    .await
}
