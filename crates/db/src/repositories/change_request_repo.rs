//! Repository for `change_requests` and its `change_request_reviews` audit trail.

use sqlx::PgPool;
use timetable_core::change_request::{ReviewDecision, STATUS_PENDING};
use timetable_core::types::DbId;

use crate::models::change_request::{
    ChangeRequest, ChangeRequestDetail, ChangeRequestFilter, ChangeRequestReview,
    CreateChangeRequest, UpdateChangeRequest,
};

const COLUMNS: &str = "id, requester_id, title, description, request_data, status, \
                       approver_id, approved_at, created_at, updated_at";

const DETAIL_SELECT: &str = "SELECT cr.id, cr.requester_id, req.name AS requester_name, \
        cr.title, cr.description, cr.request_data, cr.status, \
        cr.approver_id, appr.name AS approver_name, cr.approved_at, \
        cr.created_at, cr.updated_at \
    FROM change_requests cr \
    JOIN users req ON req.id = cr.requester_id \
    LEFT JOIN users appr ON appr.id = cr.approver_id";

const FILTER: &str = "WHERE ($1::BIGINT IS NULL OR cr.requester_id = $1)
               AND ($2::TEXT IS NULL OR cr.status = $2)
               AND ($3::TIMESTAMPTZ IS NULL OR cr.created_at >= $3)
               AND ($4::TIMESTAMPTZ IS NULL OR cr.created_at < $4)";

/// Result of trying to move a request out of `pending`.
#[derive(Debug)]
pub enum DecisionOutcome {
    Applied(ChangeRequest),
    NotFound,
    /// The request exists but is no longer pending; carries its current status.
    NotPending(String),
}

/// Provides CRUD and review operations for change requests.
pub struct ChangeRequestRepo;

impl ChangeRequestRepo {
    /// Insert a new request in `pending` state.
    pub async fn create(
        pool: &PgPool,
        requester_id: DbId,
        input: &CreateChangeRequest,
    ) -> Result<ChangeRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO change_requests (requester_id, title, description, request_data, status)
             VALUES ($1, $2, COALESCE($3, ''), COALESCE($4, '{{}}'::jsonb), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeRequest>(&query)
            .bind(requester_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.request_data)
            .bind(STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ChangeRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM change_requests WHERE id = $1");
        sqlx::query_as::<_, ChangeRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a request with requester and approver names resolved.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ChangeRequestDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE cr.id = $1");
        sqlx::query_as::<_, ChangeRequestDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests newest first, with limit/offset already clamped.
    pub async fn list(
        pool: &PgPool,
        filter: &ChangeRequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChangeRequestDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} {FILTER}
             ORDER BY cr.created_at DESC, cr.id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, ChangeRequestDetail>(&query)
            .bind(filter.requester_id)
            .bind(&filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count requests matching the filter, independent of pagination.
    pub async fn count(pool: &PgPool, filter: &ChangeRequestFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM change_requests cr {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.requester_id)
            .bind(&filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(pool)
            .await
    }

    /// Edit title, description or payload of a request that is still pending.
    ///
    /// Returns `None` if the row does not exist or has left `pending`.
    pub async fn update_pending(
        pool: &PgPool,
        id: DbId,
        input: &UpdateChangeRequest,
    ) -> Result<Option<ChangeRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE change_requests SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                request_data = COALESCE($4, request_data)
             WHERE id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeRequest>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.request_data)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Move a pending request to the decision's target status and record a
    /// review row, atomically.
    ///
    /// The status guard lives in the `UPDATE` itself, so two reviewers racing
    /// on the same request cannot both succeed.
    pub async fn apply_decision(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
        decision: ReviewDecision,
        comment: Option<&str>,
    ) -> Result<DecisionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE change_requests SET
                status = $2,
                approver_id = CASE WHEN $4 THEN $3 ELSE approver_id END,
                approved_at = CASE WHEN $4 THEN NOW() ELSE approved_at END
             WHERE id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ChangeRequest>(&query)
            .bind(id)
            .bind(decision.target_status())
            .bind(reviewer_id)
            .bind(decision.records_approver())
            .bind(STATUS_PENDING)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = updated else {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM change_requests WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Ok(match current {
                Some(status) => DecisionOutcome::NotPending(status),
                None => DecisionOutcome::NotFound,
            });
        };

        sqlx::query(
            "INSERT INTO change_request_reviews (change_request_id, reviewer_id, decision, comment)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(reviewer_id)
        .bind(decision.target_status())
        .bind(comment.map(str::trim).filter(|c| !c.is_empty()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(DecisionOutcome::Applied(request))
    }

    /// Review history of a request, oldest first.
    pub async fn list_reviews(
        pool: &PgPool,
        change_request_id: DbId,
    ) -> Result<Vec<ChangeRequestReview>, sqlx::Error> {
        sqlx::query_as::<_, ChangeRequestReview>(
            "SELECT r.id, r.change_request_id, r.reviewer_id, u.name AS reviewer_name,
                    r.decision, r.comment, r.created_at
             FROM change_request_reviews r
             JOIN users u ON u.id = r.reviewer_id
             WHERE r.change_request_id = $1
             ORDER BY r.created_at, r.id",
        )
        .bind(change_request_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a request and its review history.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM change_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
