//! Aggregate counts for the admin dashboard.

use sqlx::PgPool;
use timetable_core::change_request::STATUS_PENDING;
use timetable_core::roles::{ROLE_ADMIN, ROLE_STUDENT, ROLE_TEACHER};

use crate::models::dashboard::DashboardStats;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Count users by role, catalog rows, timetable entries and pending requests.
    pub async fn stats(pool: &PgPool) -> Result<DashboardStats, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            "SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE role = $1) AS admins,
                (SELECT COUNT(*) FROM users WHERE role = $2) AS teachers,
                (SELECT COUNT(*) FROM users WHERE role = $3) AS students,
                (SELECT COUNT(*) FROM classes) AS classes,
                (SELECT COUNT(*) FROM subjects) AS subjects,
                (SELECT COUNT(*) FROM timetables) AS timetable_entries,
                (SELECT COUNT(*) FROM change_requests WHERE status = $4) AS pending_requests",
        )
        .bind(ROLE_ADMIN)
        .bind(ROLE_TEACHER)
        .bind(ROLE_STUDENT)
        .bind(STATUS_PENDING)
        .fetch_one(pool)
        .await
    }
}
