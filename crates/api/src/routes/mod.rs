pub mod admin;
pub mod auth;
pub mod classes;
pub mod health;
pub mod requests;
pub mod student;
pub mod subjects;
pub mod timetables;
pub mod transfer;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                       login (public)
/// /auth/refresh                     refresh (public)
/// /auth/logout                      logout (requires auth)
/// /auth/me                          current user (requires auth)
/// /auth/change-password             change own password (requires auth)
/// /auth/users                       list, create (admin only)
///
/// /classes                          list, create
/// /classes/{id}                     get, update, delete
///
/// /subjects                         list, create
/// /subjects/{id}                    get, update, delete
///
/// /timetables                       list, create
/// /timetables/weekly/{class_id}     weekly grid
/// /timetables/{id}                  get, update, delete
///
/// /requests                         list, create (teacher or admin)
/// /requests/{id}                    get, update, delete
/// /requests/{id}/approve            approve (admin only)
/// /requests/{id}/reject             reject (admin only)
/// /requests/{id}/cancel             cancel (requester or admin)
///
/// /csv/import/subjects              subject CSV upload (admin only)
/// /csv/import/timetables            timetable CSV upload (admin only)
/// /csv/export/timetables            timetable CSV download
/// /csv/export/subjects              subject CSV download
///
/// /student/timetable                weekly grid (student only)
///
/// /admin/dashboard                  entity counts (admin only)
/// ```
///
/// Reads on classes, subjects and timetables need any valid token; writes
/// need an admin.
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/classes", classes::router())
        .nest("/subjects", subjects::router())
        .nest("/timetables", timetables::router())
        .nest("/requests", requests::router())
        .nest("/csv", transfer::router(config.max_upload_bytes))
        .nest("/student", student::router())
        .nest("/admin", admin::router())
}
