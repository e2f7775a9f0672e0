//! Showcase submission and moderation rules.

use academy_lib::entity::showcase_image;
use academy_lib::models::UserRole;
use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_submit_requires_an_image() {
    let owner = Uuid::now_v7();
    let draft = showcase_model(owner, "draft");
    let (pool, conn) = logged_pool(
        mock_db()
            .append_query_results([vec![draft.clone()]])
            .append_query_results([Vec::<showcase_image::Model>::new()]),
    );
    let app = create_test_app(pool).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/showcases/{}/submit", draft.id))
        .cookie(session_cookie(owner, UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["images"], json!(["At least one image is required"]));
    assert!(body["errors"]["title"].is_null());

    assert!(executed_sql(conn).iter().all(|s| !s.starts_with("UPDATE")));
}

#[actix_rt::test]
async fn test_pending_showcase_cannot_be_resubmitted() {
    let owner = Uuid::now_v7();
    let pending = showcase_model(owner, "pending");
    let db = mock_db().append_query_results([vec![pending.clone()]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/showcases/{}/submit", pending.id))
        .cookie(session_cookie(owner, UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["status"].is_array());
}

#[actix_rt::test]
async fn test_other_members_cannot_submit() {
    let draft = showcase_model(Uuid::now_v7(), "draft");
    let db = mock_db().append_query_results([vec![draft.clone()]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/showcases/{}/submit", draft.id))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_rt::test]
async fn test_reject_needs_a_real_reason() {
    let app = create_test_app(pool_from(mock_db())).await;

    for reason in ["", "   \n\t"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/moderation/showcases/{}/reject", Uuid::now_v7()))
            .cookie(session_cookie(Uuid::now_v7(), UserRole::Moderator))
            .set_json(json!({ "reason": reason }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 422, "reason {:?}", reason);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["errors"]["reason"],
            json!(["A rejection reason is required"])
        );
    }
}

#[actix_rt::test]
async fn test_draft_cannot_be_approved() {
    let draft = showcase_model(Uuid::now_v7(), "draft");
    let db = mock_db().append_query_results([vec![draft.clone()]]);
    let app = create_test_app(pool_from(db)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/moderation/showcases/{}/approve", draft.id))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Moderator))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["status"],
        json!(["A showcase in draft status cannot be approved"])
    );
}
