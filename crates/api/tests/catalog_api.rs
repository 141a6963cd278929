//! Integration tests for the class and subject catalog endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, delete_auth, get_auth, post_json_auth, put_json_auth, seed_class,
    seed_subject, user_with_token,
};
use sqlx::PgPool;
use timetable_core::timetable::DayOfWeek;
use timetable_db::models::timetable::TimetableValues;
use timetable_db::repositories::TimetableRepo;

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// Full create / read / update / delete cycle for a class.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_class_crud(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/classes",
        serde_json::json!({ "grade": 2, "class_name": " B " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["class_name"], "B");

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/classes/{id}"),
        serde_json::json!({ "grade": 3 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["grade"], 3);
    assert_eq!(json["data"]["class_name"], "B");

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/classes/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/classes/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NOT_FOUND");
}

/// Grades outside 1-5 and names containing '-' are rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_class_validation(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;

    for body in [
        serde_json::json!({ "grade": 6, "class_name": "A" }),
        serde_json::json!({ "grade": 1, "class_name": "A-1" }),
        serde_json::json!({ "grade": 1, "class_name": "" }),
    ] {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/classes",
            body,
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

/// (grade, class_name) is unique.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_class_conflicts(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;
    seed_class(&pool, 1, "A").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/classes",
        serde_json::json!({ "grade": 1, "class_name": "A" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Any authenticated role may read classes, filtered by grade.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_classes_by_grade(pool: PgPool) {
    let (_student, token) = user_with_token(&pool, "kid@school.test", "student").await;
    seed_class(&pool, 1, "A").await;
    seed_class(&pool, 1, "B").await;
    seed_class(&pool, 2, "A").await;

    let response = get_auth(common::build_test_app(pool), "/api/classes?grade=1", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

/// Only admins may write classes.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teacher_cannot_create_class(pool: PgPool) {
    let (_teacher, token) = user_with_token(&pool, "t@school.test", "teacher").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/classes",
        serde_json::json!({ "grade": 1, "class_name": "A" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// Terms are stored in canonical form whatever spelling was sent.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_subject_normalizes_term(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/subjects",
        serde_json::json!({
            "code": "MATH1",
            "name": "Mathematics I",
            "category": "science",
            "term": "First-Half",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["term"], "first_half");
    assert_eq!(json["data"]["credits"], 1);
}

/// Unknown terms and codes with whitespace are rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subject_validation(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;

    for body in [
        serde_json::json!({ "code": "X1", "name": "X", "category": "c", "term": "winter" }),
        serde_json::json!({ "code": "X 1", "name": "X", "category": "c", "term": "full_year" }),
        serde_json::json!({ "code": "X2", "name": "X", "category": "c", "term": "full_year", "credits": 0 }),
    ] {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/subjects",
            body,
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

/// `total` counts all matches while `items` holds one page.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subject_pagination(pool: PgPool) {
    let (_teacher, token) = user_with_token(&pool, "t@school.test", "teacher").await;
    for i in 0..5 {
        seed_subject(&pool, &format!("S{i}"), &format!("Subject {i}")).await;
    }

    let response = get_auth(
        common::build_test_app(pool),
        "/api/subjects?limit=2&offset=2",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 5);
    assert_eq!(json["data"]["limit"], 2);
    assert_eq!(json["data"]["offset"], 2);
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["code"], "S2");
}

/// Partial updates leave other fields alone; duplicate codes conflict.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_subject(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;
    let subject = seed_subject(&pool, "ENG", "English").await;
    seed_subject(&pool, "ART", "Art").await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/subjects/{}", subject.id),
        serde_json::json!({ "name": "English Literature", "term": "second half" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["code"], "ENG");
    assert_eq!(json["data"]["name"], "English Literature");
    assert_eq!(json["data"]["term"], "second_half");

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/subjects/{}", subject.id),
        serde_json::json!({ "code": "ART" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Whitespace-only names and categories are rejected on update.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_subject_rejects_blank_fields(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;
    let subject = seed_subject(&pool, "ENG", "English").await;

    for body in [
        serde_json::json!({ "name": "   " }),
        serde_json::json!({ "category": "  " }),
        serde_json::json!({ "code": " " }),
    ] {
        let response = put_json_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/subjects/{}", subject.id),
            body,
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/subjects/{}", subject.id),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "English");
    assert_eq!(json["data"]["category"], "general");
}

/// `description: null` clears the description; omitting it keeps it.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_subject_clears_description(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;
    let subject = seed_subject(&pool, "ENG", "English").await;
    let uri = format!("/api/subjects/{}", subject.id);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "description": "Reading and writing" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["description"], "Reading and writing");

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "credits": 2 }),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["credits"], 2);
    assert_eq!(json["data"]["description"], "Reading and writing");

    let response = put_json_auth(
        common::build_test_app(pool),
        &uri,
        serde_json::json!({ "description": null }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["description"].is_null());
}

/// A subject that is still scheduled cannot be deleted.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_scheduled_subject_conflicts(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin@school.test", "admin").await;
    let teacher = create_user(&pool, "t@school.test", "teacher").await;
    let class = seed_class(&pool, 1, "A").await;
    let subject = seed_subject(&pool, "PE", "Physical Education").await;
    TimetableRepo::create(
        &pool,
        &TimetableValues {
            class_id: class.id,
            subject_id: subject.id,
            teacher_id: teacher.id,
            day: DayOfWeek::Monday,
            period: 1,
            room: None,
        },
    )
    .await
    .unwrap();

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/subjects/{}", subject.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
