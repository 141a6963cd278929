//! Request body validation helpers.

use timetable_core::error::CoreError;
use validator::Validate;

use crate::error::AppError;

/// Run `validator` rules on a request body, mapping failures to a 400.
pub fn validate_request<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::Core(CoreError::from(errors)))
}

/// Map a pure domain check that reports a plain message to a 400.
pub fn check(result: Result<(), String>) -> Result<(), AppError> {
    result.map_err(|msg| AppError::Core(CoreError::Validation(msg)))
}
