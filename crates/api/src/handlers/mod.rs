pub mod admin;
pub mod auth;
pub mod classes;
pub mod requests;
pub mod student;
pub mod subjects;
pub mod timetables;
pub mod transfer;
