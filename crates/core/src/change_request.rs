//! Change request approval workflow.
//!
//! A change request proposes a timetable modification and waits for an admin
//! decision. Requests start `pending`; `approved`, `rejected` and `canceled`
//! are terminal.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Initial status of every new request.
pub const STATUS_PENDING: &str = "pending";
/// An admin accepted the proposed change.
pub const STATUS_APPROVED: &str = "approved";
/// An admin declined the proposed change.
pub const STATUS_REJECTED: &str = "rejected";
/// The requester (or an admin) withdrew the request.
pub const STATUS_CANCELED: &str = "canceled";

/// All valid change request statuses.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_APPROVED,
    STATUS_REJECTED,
    STATUS_CANCELED,
];

/// Maximum title length (characters).
pub const MAX_TITLE_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Returns the set of statuses that `from_status` may transition to.
///
/// - `pending` -> `approved`, `rejected`, `canceled`
/// - terminal states have no outgoing transitions
pub fn valid_transitions(from_status: &str) -> &'static [&'static str] {
    match from_status {
        STATUS_PENDING => &[STATUS_APPROVED, STATUS_REJECTED, STATUS_CANCELED],
        _ => &[],
    }
}

/// Whether a request in `status` has reached a final decision.
pub fn is_terminal(status: &str) -> bool {
    valid_transitions(status).is_empty()
}

/// Validate that a status transition from `current` to `next` is allowed.
///
/// Re-approving an approved request is rejected rather than treated as a
/// no-op, so the recorded approver and timestamp are never overwritten.
pub fn validate_transition(current: &str, next: &str) -> Result<(), CoreError> {
    if valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Cannot move change request from '{current}' to '{next}'"
        )))
    }
}

/// Validate that a status string is one of the known statuses.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

/// Edits are only accepted while the request is still awaiting review.
pub fn ensure_editable(status: &str) -> Result<(), CoreError> {
    if status == STATUS_PENDING {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Change request is already {status} and can no longer be edited"
        )))
    }
}

// ---------------------------------------------------------------------------
// Review decisions
// ---------------------------------------------------------------------------

/// Outcome recorded in the review audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
    Cancel,
}

impl ReviewDecision {
    /// Status the request moves to when this decision is applied.
    pub fn target_status(self) -> &'static str {
        match self {
            ReviewDecision::Approve => STATUS_APPROVED,
            ReviewDecision::Reject => STATUS_REJECTED,
            ReviewDecision::Cancel => STATUS_CANCELED,
        }
    }

    /// Whether applying this decision records the reviewer as approver.
    ///
    /// Cancellation is a withdrawal, not a review, so it leaves `approver_id`
    /// and `approved_at` unset.
    pub fn records_approver(self) -> bool {
        !matches!(self, ReviewDecision::Cancel)
    }
}
