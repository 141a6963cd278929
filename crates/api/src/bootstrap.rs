//! Startup seeding of the first admin account.

use timetable_core::roles::ROLE_ADMIN;
use timetable_db::models::user::CreateUser;
use timetable_db::repositories::UserRepo;
use timetable_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::handlers::auth::normalize_email;

/// Create the configured admin unless a user with that email already exists.
///
/// Returns `true` when an account was created.
pub async fn ensure_admin(pool: &DbPool, admin: &BootstrapAdmin) -> Result<bool, AppError> {
    let email = normalize_email(&admin.email);
    if UserRepo::find_by_email(pool, &email).await?.is_some() {
        return Ok(false);
    }

    validate_password_strength(&admin.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: admin.name.clone(),
            email,
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Bootstrap admin created");
    Ok(true)
}
