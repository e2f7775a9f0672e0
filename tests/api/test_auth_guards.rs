//! Session and role guards reject requests before touching the database.

use academy_lib::models::UserRole;
use actix_web::cookie::Cookie;
use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_dashboard_requires_session() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_tampered_token_is_rejected() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/lessons/{}/complete", Uuid::now_v7()))
        .cookie(Cookie::new(
            academy_lib::services::linkedin_oauth::ACCESS_COOKIE,
            "not-a-jwt",
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_rt::test]
async fn test_member_cannot_create_courses() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/courses")
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Member))
        .set_json(json!({ "title": "Contract Drafting" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_rt::test]
async fn test_moderator_cannot_manage_lessons() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/lessons/{}", Uuid::now_v7()))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Moderator))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[actix_rt::test]
async fn test_member_cannot_see_moderation_queue() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/moderation/showcases")
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[actix_rt::test]
async fn test_admin_course_title_is_validated_first() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/courses")
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Admin))
        .set_json(json!({ "title": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert_eq!(body["errors"]["title"][0], "The title field is required");
}

#[actix_rt::test]
async fn test_admin_cannot_change_own_role() {
    let app = create_test_app(pool_from(mock_db())).await;
    let admin_id = Uuid::now_v7();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/users/{}/role", admin_id))
        .cookie(session_cookie(admin_id, UserRole::Admin))
        .set_json(json!({ "role": "member" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["role"].is_array());
}
