//! Admin dashboard aggregate counts.

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub admins: i64,
    pub teachers: i64,
    pub students: i64,
    pub classes: i64,
    pub subjects: i64,
    pub timetable_entries: i64,
    pub pending_requests: i64,
}
