//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod change_request_repo;
pub mod class_repo;
pub mod dashboard_repo;
pub mod subject_repo;
pub mod timetable_repo;
pub mod transfer_repo;
pub mod user_repo;

pub use change_request_repo::ChangeRequestRepo;
pub use class_repo::ClassRepo;
pub use dashboard_repo::DashboardRepo;
pub use subject_repo::SubjectRepo;
pub use timetable_repo::TimetableRepo;
pub use transfer_repo::TransferRepo;
pub use user_repo::UserRepo;
