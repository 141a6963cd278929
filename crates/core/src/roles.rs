//! Role name constants and the access-tier decision function.
//!
//! The role names must match the `CHECK` constraint on `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_STUDENT: &str = "student";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_TEACHER, ROLE_STUDENT];

/// Validate that a role string is one of the defined roles.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}

/// Capability tier required by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    AnyAuthenticated,
    TeacherOrAdmin,
    AdminOnly,
    StudentOnly,
}

impl AccessTier {
    /// Returns `true` when a verified role claim satisfies this tier.
    pub fn permits(self, role: &str) -> bool {
        match self {
            AccessTier::AnyAuthenticated => VALID_ROLES.contains(&role),
            AccessTier::TeacherOrAdmin => role == ROLE_TEACHER || role == ROLE_ADMIN,
            AccessTier::AdminOnly => role == ROLE_ADMIN,
            AccessTier::StudentOnly => role == ROLE_STUDENT,
        }
    }

    /// Message used when a request is denied at this tier.
    pub fn denial_message(self) -> &'static str {
        match self {
            AccessTier::AnyAuthenticated => "A valid role is required",
            AccessTier::TeacherOrAdmin => "Teacher or Admin role required",
            AccessTier::AdminOnly => "Admin role required",
            AccessTier::StudentOnly => "Student role required",
        }
    }
}
