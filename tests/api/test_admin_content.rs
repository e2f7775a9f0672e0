//! Readiness rules on course and lesson administration.

use academy_lib::entity::{course, course_tag, lesson, lesson_instructor, lesson_tag};
use academy_lib::models::UserRole;
use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use super::test_helpers::*;

fn admin() -> actix_web::cookie::Cookie<'static> {
    session_cookie(Uuid::now_v7(), UserRole::Admin)
}

#[actix_rt::test]
async fn test_scheduling_unready_lesson_lists_missing_items() {
    let mut unsynced = lesson_model(Uuid::now_v7());
    unsynced.publish_date = None;
    unsynced.playback_id = None;
    unsynced.duration_seconds = None;
    let db = mock_db()
        .append_query_results([vec![unsynced.clone()]])
        .append_query_results([vec![count_row(0)]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/lessons/{}/publish-date", unsynced.id))
        .cookie(admin())
        .set_json(json!({ "publish_date": "2026-11-02T09:00:00Z" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["publish_date"],
        json!([
            "The playback ID is required",
            "The duration is required",
            "The transcript is required"
        ])
    );
}

#[actix_rt::test]
async fn test_clearing_publish_date_skips_readiness() {
    let mut scheduled = lesson_model(Uuid::now_v7());
    scheduled.tagline = None;
    let mut cleared = scheduled.clone();
    cleared.publish_date = None;

    let db = mock_db()
        .append_query_results([vec![scheduled.clone()]])
        .append_query_results([vec![cleared]])
        .append_query_results([vec![count_row(0)]])
        .append_query_results([Vec::<lesson_tag::Model>::new()])
        .append_query_results([Vec::<lesson_instructor::Model>::new()]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/lessons/{}/publish-date", scheduled.id))
        .cookie(admin())
        .set_json(json!({ "publish_date": null }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["publish_date"].is_null());
    assert_eq!(body["readiness"]["ready"], false);
}

#[actix_rt::test]
async fn test_previewing_unready_course_is_rejected() {
    let mut draft = course_model();
    draft.publish_date = None;
    draft.learning_objectives = None;
    let db = mock_db().append_query_results([vec![draft.clone()]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/courses/{}/visibility", draft.id))
        .cookie(admin())
        .set_json(json!({ "is_visible": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["is_visible"],
        json!(["The learning objectives is required"])
    );
}

#[actix_rt::test]
async fn test_hiding_course_is_always_allowed() {
    let mut visible = course_model();
    visible.publish_date = None;
    visible.is_visible = true;
    visible.tagline = None;
    let mut hidden = visible.clone();
    hidden.is_visible = false;

    let db = mock_db()
        .append_query_results([vec![visible.clone()]])
        .append_query_results([vec![hidden]])
        .append_query_results([Vec::<course_tag::Model>::new()]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/courses/{}/visibility", visible.id))
        .cookie(admin())
        .set_json(json!({ "is_visible": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_visible"], false);
}

#[actix_rt::test]
async fn test_published_course_cannot_lose_its_content() {
    let published: course::Model = course_model();
    let db = mock_db().append_query_results([vec![published.clone()]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/courses/{}", published.id))
        .cookie(admin())
        .set_json(json!({
            "title": published.title,
            "tagline": "   ",
            "description": published.description,
            "learning_objectives": published.learning_objectives
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["publish_date"], json!(["The tagline is required"]));
}

#[actix_rt::test]
async fn test_published_lesson_keeps_its_asset() {
    let published: lesson::Model = lesson_model(Uuid::now_v7());
    let (pool, conn) = logged_pool(mock_db().append_query_results([vec![published.clone()]]));
    let app = create_test_app(pool).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/lessons/{}", published.id))
        .cookie(admin())
        .set_json(json!({
            "title": published.title,
            "tagline": published.tagline,
            "description": published.description,
            "asset_id": "asset-replacement"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["asset_id"].is_array());

    let sql = executed_sql(conn);
    assert!(sql.iter().all(|s| !s.contains("transcript_lines")));
    assert!(sql.iter().all(|s| !s.starts_with("UPDATE")));
}

#[actix_rt::test]
async fn test_visible_lesson_cannot_lose_its_description() {
    let mut preview = lesson_model(Uuid::now_v7());
    preview.publish_date = None;
    preview.is_visible = true;
    let db = mock_db()
        .append_query_results([vec![preview.clone()]])
        .append_query_results([vec![count_row(14)]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/lessons/{}", preview.id))
        .cookie(admin())
        .set_json(json!({
            "title": preview.title,
            "tagline": preview.tagline,
            "description": "",
            "asset_id": preview.asset_id
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["is_visible"], json!(["The description is required"]));
}
