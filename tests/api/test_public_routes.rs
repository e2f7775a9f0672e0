//! Anonymous routes served from the mock database.

use academy_lib::entity::{practice_area, tag, user};
use academy_lib::models::UserRole;
use actix_web::test;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::test_helpers::*;

fn tag_model(name: &str) -> tag::Model {
    let now = Utc::now();
    tag::Model {
        id: Uuid::now_v7(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        created_at: now,
        updated_at: now,
    }
}

#[actix_rt::test]
async fn test_health_reports_version() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_rt::test]
async fn test_tags_are_listed() {
    let db = mock_db().append_query_results([vec![tag_model("Contracts"), tag_model("Privacy Law")]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::get().uri("/api/v1/tags").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    let tags = body.as_array().expect("array");
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["name"], "Contracts");
    assert_eq!(tags[1]["slug"], "privacy-law");
}

#[actix_rt::test]
async fn test_unknown_practice_area_filter_returns_empty_page() {
    let db = mock_db().append_query_results([Vec::<practice_area::Model>::new()]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/showcases?practice_area=space-law&limit=5")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["showcases"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["pagination"]["limit"], 5);
    assert_eq!(body["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn test_private_file_keys_are_not_served() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/files/exports/users.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_rt::test]
async fn test_me_is_null_without_session() {
    let app = create_test_app(pool_from(mock_db())).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["user"].is_null());
}

#[actix_rt::test]
async fn test_me_returns_profile_for_session() {
    let id = Uuid::now_v7();
    let db = mock_db().append_query_results([vec![user_model(id, UserRole::Moderator)]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(session_cookie(id, UserRole::Moderator))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], id.to_string());
    assert_eq!(body["user"]["role"], "moderator");
}

#[actix_rt::test]
async fn test_unknown_user_profile_is_404() {
    let db = mock_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/users/{}", Uuid::now_v7()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}
