//! Domain rules shared by the database and HTTP layers.
//!
//! Nothing in this crate performs I/O; every function is a pure rule over
//! plain values so it can be unit tested without a database.

pub mod change_request;
pub mod error;
pub mod pagination;
pub mod roles;
pub mod subject;
pub mod timetable;
pub mod transfer;
pub mod types;
