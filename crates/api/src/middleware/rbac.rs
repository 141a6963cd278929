//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! satisfy the endpoint's [`AccessTier`]. A missing or invalid token is a 401;
//! a valid token with the wrong role is a 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use timetable_core::error::CoreError;
use timetable_core::roles::AccessTier;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate the request and check the caller's role against `tier`.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    tier: AccessTier,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !tier.permits(&user.role) {
        tracing::debug!(user_id = user.user_id, role = %user.role, ?tier, "Access denied");
        return Err(AppError::Core(CoreError::Forbidden(
            tier.denial_message().into(),
        )));
    }
    Ok(user)
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessTier::AdminOnly)
            .await
            .map(RequireAdmin)
    }
}

/// Requires `teacher` or `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireTeacher(pub AuthUser);

impl FromRequestParts<AppState> for RequireTeacher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessTier::TeacherOrAdmin)
            .await
            .map(RequireTeacher)
    }
}

/// Requires the `student` role. Rejects with 403 Forbidden otherwise.
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessTier::StudentOnly)
            .await
            .map(RequireStudent)
    }
}

/// Requires any authenticated user with a known role.
///
/// Named explicitly for handlers where "this route requires authentication"
/// should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessTier::AnyAuthenticated)
            .await
            .map(RequireAuth)
    }
}
