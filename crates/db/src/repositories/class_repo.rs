//! Repository for the `classes` table.

use sqlx::PgPool;
use timetable_core::types::DbId;

use crate::models::class::{ClassFilter, CreateClass, SchoolClass, UpdateClass};

const COLUMNS: &str = "id, grade, class_name, created_at, updated_at";

/// Provides CRUD operations for classes.
pub struct ClassRepo;

impl ClassRepo {
    pub async fn create(pool: &PgPool, input: &CreateClass) -> Result<SchoolClass, sqlx::Error> {
        let query = format!(
            "INSERT INTO classes (grade, class_name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchoolClass>(&query)
            .bind(input.grade)
            .bind(input.class_name.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SchoolClass>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM classes WHERE id = $1");
        sqlx::query_as::<_, SchoolClass>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List classes ordered by grade, then name.
    pub async fn list(pool: &PgPool, filter: &ClassFilter) -> Result<Vec<SchoolClass>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM classes
             WHERE ($1::SMALLINT IS NULL OR grade = $1)
             ORDER BY grade, class_name"
        );
        sqlx::query_as::<_, SchoolClass>(&query)
            .bind(filter.grade)
            .fetch_all(pool)
            .await
    }

    /// Update a class. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClass,
    ) -> Result<Option<SchoolClass>, sqlx::Error> {
        let query = format!(
            "UPDATE classes SET
                grade = COALESCE($2, grade),
                class_name = COALESCE($3, class_name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchoolClass>(&query)
            .bind(id)
            .bind(input.grade)
            .bind(input.class_name.as_deref().map(str::trim))
            .fetch_optional(pool)
            .await
    }

    /// Delete a class and, by cascade, its timetable entries.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
