//! Repository for the `subjects` table.

use sqlx::PgPool;
use timetable_core::types::DbId;

use crate::models::subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject};

const COLUMNS: &str =
    "id, code, name, category, term, credits, description, created_at, updated_at";

const FILTER: &str = "WHERE ($1::TEXT IS NULL OR category = $1)
               AND ($2::TEXT IS NULL OR term = $2)";

/// Provides CRUD operations for subjects.
pub struct SubjectRepo;

impl SubjectRepo {
    pub async fn create(pool: &PgPool, input: &CreateSubject) -> Result<Subject, sqlx::Error> {
        let query = format!(
            "INSERT INTO subjects (code, name, category, term, credits, description)
             VALUES ($1, $2, $3, $4, COALESCE($5, 1), $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(input.code.trim())
            .bind(input.name.trim())
            .bind(input.category.trim())
            .bind(&input.term)
            .bind(input.credits)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subjects WHERE id = $1");
        sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List subjects ordered by code, with limit/offset already clamped.
    pub async fn list(
        pool: &PgPool,
        filter: &SubjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subjects {FILTER}
             ORDER BY code
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(&filter.category)
            .bind(&filter.term)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count subjects matching the filter, ignoring pagination.
    pub async fn count(pool: &PgPool, filter: &SubjectFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM subjects {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.category)
            .bind(&filter.term)
            .fetch_one(pool)
            .await
    }

    /// Update a subject. Only non-`None` fields in `input` are applied; an
    /// explicit `null` description clears it.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSubject,
    ) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!(
            "UPDATE subjects SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                term = COALESCE($5, term),
                credits = COALESCE($6, credits),
                description = CASE WHEN $8 THEN $7 ELSE description END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .bind(input.code.as_deref().map(str::trim))
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.category.as_deref().map(str::trim))
            .bind(&input.term)
            .bind(input.credits)
            .bind(input.description.clone().flatten())
            .bind(input.description.is_some())
            .fetch_optional(pool)
            .await
    }

    /// Delete a subject. Fails with a foreign-key violation while it is scheduled.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
