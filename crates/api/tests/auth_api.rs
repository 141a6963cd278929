//! HTTP-level integration tests for the auth endpoints and role enforcement.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, login, post_auth, post_json, post_json_auth,
    user_with_token, TEST_PASSWORD,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns the camelCase token envelope and the user.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "admin@school.test", "admin").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "admin@school.test", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["token"].is_string(), "response must contain token");
    assert!(json["refreshToken"].is_string(), "response must contain refreshToken");
    assert_eq!(json["expiresIn"], 24 * 3600);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["role"], "admin");
    assert!(json["user"].get("password_hash").is_none());
}

/// Email lookup ignores case and surrounding whitespace.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_email_is_case_insensitive(pool: PgPool) {
    create_user(&pool, "teacher@school.test", "teacher").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "  Teacher@School.TEST ", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
}

/// Wrong password and unknown email produce the same 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_failures_are_indistinguishable(pool: PgPool) {
    create_user(&pool, "known@school.test", "teacher").await;

    let wrong_pw = post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/login",
        serde_json::json!({ "email": "known@school.test", "password": "nope-nope" }),
    )
    .await;
    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    let wrong_pw = body_json(wrong_pw).await;

    let unknown = post_json(
        common::build_test_app(pool),
        "/api/auth/login",
        serde_json::json!({ "email": "ghost@school.test", "password": "whatever" }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown = body_json(unknown).await;

    assert_eq!(wrong_pw["success"], false);
    assert_eq!(wrong_pw["error"], "UNAUTHORIZED");
    assert_eq!(wrong_pw["message"], unknown["message"]);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// `/auth/me` returns the caller.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_returns_current_user(pool: PgPool) {
    let (user, token) = user_with_token(&pool, "me@school.test", "student").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["email"], "me@school.test");
}

/// Requests without a token are rejected with 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_without_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/auth/me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "UNAUTHORIZED");
}

/// A refresh token issues a new pair; an access token is not accepted there.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_flow(pool: PgPool) {
    create_user(&pool, "refresh@school.test", "teacher").await;

    let login_response = post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/login",
        serde_json::json!({ "email": "refresh@school.test", "password": TEST_PASSWORD }),
    )
    .await;
    let login_json = body_json(login_response).await;
    let access = login_json["token"].as_str().unwrap().to_string();
    let refresh = login_json["refreshToken"].as_str().unwrap().to_string();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/refresh",
        serde_json::json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "refresh@school.test");

    let response = post_json(
        common::build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refreshToken": access }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A refresh token cannot be used as a bearer token.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_token_rejected_as_bearer(pool: PgPool) {
    create_user(&pool, "bearer@school.test", "teacher").await;

    let login_response = post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/login",
        serde_json::json!({ "email": "bearer@school.test", "password": TEST_PASSWORD }),
    )
    .await;
    let login_json = body_json(login_response).await;
    let refresh = login_json["refreshToken"].as_str().unwrap();

    let response = get_auth(common::build_test_app(pool), "/api/auth/me", refresh).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout acknowledges a valid session.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "bye@school.test", "teacher").await;
    let app = common::build_test_app(pool);

    let response = post_auth(app, "/api/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

/// The new password works and the old one stops working.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "pw@school.test", "teacher").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/auth/change-password",
        serde_json::json!({ "currentPassword": TEST_PASSWORD, "newPassword": "brand-new-secret" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    login(
        common::build_test_app(pool.clone()),
        "pw@school.test",
        "brand-new-secret",
    )
    .await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/auth/login",
        serde_json::json!({ "email": "pw@school.test", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A wrong current password fails even when the new password is too short.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_checks_current_first(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "pw2@school.test", "teacher").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/auth/change-password",
        serde_json::json!({ "currentPassword": "not-my-password", "newPassword": "x" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Current password is incorrect");
}

/// A new password below the minimum length is rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_too_short(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "pw3@school.test", "teacher").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/auth/change-password",
        serde_json::json!({ "currentPassword": TEST_PASSWORD, "newPassword": "abc" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// User management
// ---------------------------------------------------------------------------

/// Admins create users; a duplicate email is a 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_and_duplicate(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "root@school.test", "admin").await;

    let body = serde_json::json!({
        "email": "New.Teacher@school.test",
        "password": "secret-enough",
        "name": "New Teacher",
        "role": "teacher",
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/auth/users",
        body.clone(),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "new.teacher@school.test");
    assert_eq!(json["data"]["role"], "teacher");

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/auth/users",
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Unknown roles are rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_invalid_role(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "root2@school.test", "admin").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "email": "janitor@school.test",
        "password": "secret-enough",
        "name": "Janitor",
        "role": "janitor",
    });
    let response = post_json_auth(app, "/api/auth/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A name made only of spaces is rejected; real names are trimmed.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_rejects_blank_name(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "root@school.test", "admin").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/auth/users",
        serde_json::json!({
            "email": "blank@school.test",
            "password": "secret-enough",
            "name": "   ",
            "role": "teacher",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/auth/users",
        serde_json::json!({
            "email": "blank@school.test",
            "password": "secret-enough",
            "name": "  Ms Tanaka  ",
            "role": "teacher",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["name"], "Ms Tanaka");
}

/// Listing users can be filtered by role.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_users_by_role(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "root3@school.test", "admin").await;
    create_user(&pool, "t1@school.test", "teacher").await;
    create_user(&pool, "s1@school.test", "student").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/auth/users?role=teacher", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let users = json["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "t1@school.test");
}

// ---------------------------------------------------------------------------
// Role enforcement
// ---------------------------------------------------------------------------

/// Teachers cannot reach admin-only endpoints.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teacher_forbidden_from_admin_routes(pool: PgPool) {
    let (_teacher, token) = user_with_token(&pool, "plain@school.test", "teacher").await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/auth/users",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "FORBIDDEN");
    assert_eq!(json["message"], "Admin role required");

    let response = get_auth(common::build_test_app(pool), "/api/admin/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Students cannot file change requests; teachers cannot use the student view.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_tiers(pool: PgPool) {
    let (_student, student_token) = user_with_token(&pool, "kid@school.test", "student").await;
    let (_teacher, teacher_token) = user_with_token(&pool, "prof@school.test", "teacher").await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/requests",
        &student_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/student/timetable?class_id=1",
        &teacher_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// The dashboard reports counts per role.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_dashboard(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "dash@school.test", "admin").await;
    create_user(&pool, "t@school.test", "teacher").await;
    create_user(&pool, "s@school.test", "student").await;
    common::seed_class(&pool, 1, "A").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/admin/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_users"], 3);
    assert_eq!(json["data"]["admins"], 1);
    assert_eq!(json["data"]["teachers"], 1);
    assert_eq!(json["data"]["students"], 1);
    assert_eq!(json["data"]["classes"], 1);
    assert_eq!(json["data"]["pending_requests"], 0);
}
