//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login             -> login
/// POST /refresh           -> refresh
/// POST /logout            -> logout (requires auth)
/// GET  /me                -> me (requires auth)
/// POST /change-password   -> change_password (requires auth)
/// GET  /users             -> list_users (admin)
/// POST /users             -> create_user (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/change-password", post(auth::change_password))
        .route("/users", get(auth::list_users).post(auth::create_user))
}
