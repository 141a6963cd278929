//! Handlers for the `/auth` resource: login, token refresh, logout, the
//! current user, password changes, and admin user management.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use timetable_core::error::CoreError;
use timetable_core::roles::validate_role;
use timetable_db::models::user::{CreateUser, CreateUserRequest, User, UserResponse};
use timetable_db::repositories::UserRepo;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, validate_token, TokenKind};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::RoleParams;
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;
use crate::validation::{check, validate_request};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with email + password. Unknown emails and wrong passwords
/// get the same 401 so the endpoint does not reveal which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&input.email);

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(Json(auth_response(&state, &user)?))
}

/// POST /api/auth/refresh
///
/// Exchange a valid refresh token for a new token pair. The user is re-read
/// so a role change takes effect on the next refresh.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = validate_token(&input.refresh_token, TokenKind::Refresh, &state.config.jwt)?;

    let user = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    tracing::debug!(user_id = user.id, "Tokens refreshed");
    Ok(Json(auth_response(&state, &user)?))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards them. Requires a valid token so
/// the call doubles as a session check.
pub async fn logout(RequireAuth(user): RequireAuth) -> Json<MessageResponse> {
    tracing::info!(user_id = user.user_id, "User logged out");
    Json(MessageResponse::new("Logged out"))
}

/// GET /api/auth/me
pub async fn me(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// POST /api/auth/change-password
///
/// The current password is checked before the new one is looked at, so a
/// wrong current password always fails regardless of the new value.
pub async fn change_password(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Validation(
            "Current password is incorrect".into(),
        )));
    }

    check(validate_password_strength(
        &input.new_password,
        MIN_PASSWORD_LENGTH,
    ))?;

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed")))
}

// ---------------------------------------------------------------------------
// User management (admin)
// ---------------------------------------------------------------------------

/// POST /api/auth/users
///
/// Create an account. Emails are unique; the role must be one of the three
/// defined roles.
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    input.name = input.name.trim().to_string();
    validate_request(&input)?;
    check(validate_role(&input.role))?;

    let email = normalize_email(&input.email);
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "A user with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // A concurrent create with the same email still fails on uq_users_email.
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name,
            email,
            password_hash,
            role: input.role.clone(),
        },
    )
    .await?;

    tracing::info!(
        user_id = user.id,
        role = %user.role,
        created_by = admin.user_id,
        "User created",
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(&user))),
    ))
}

/// GET /api/auth/users?role=
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RoleParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(role) = params.role.as_deref() {
        check(validate_role(role))?;
    }

    let users = UserRepo::list(&state.pool, params.role.as_deref()).await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();

    Ok(Json(ApiResponse::ok(users)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue an access + refresh token pair and build the response body.
fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;

    let token = generate_access_token(user.id, &user.email, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let refresh_token = generate_refresh_token(user.id, &user.email, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token,
        expires_in: jwt.access_expires_in(),
        user: UserResponse::from(user),
    })
}
