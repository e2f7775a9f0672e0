//! Refresh-token rotation and revocation on role changes.

use std::sync::Arc;

use academy_lib::entity::refresh_token;
use academy_lib::models::UserRole;
use academy_lib::services::linkedin_oauth::REFRESH_COOKIE;
use academy_lib::services::video_host::{MuxVideoHost, VideoHostService};
use actix_web::cookie::Cookie;
use actix_web::test;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use super::test_helpers::*;

fn refresh_token_model(user_id: Uuid) -> refresh_token::Model {
    let now = Utc::now();
    refresh_token::Model {
        id: Uuid::now_v7(),
        user_id,
        token_hash: "0".repeat(64),
        expires_at: now + Duration::days(7),
        revoked_at: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[actix_rt::test]
async fn test_refresh_token_is_single_use() {
    let mut config = test_config();
    config.linkedin_oauth.enabled = true;
    let video_host: Arc<dyn VideoHostService> =
        Arc::new(MuxVideoHost::new(&config.mux).expect("Mux client"));

    // Found as valid, but a concurrent refresh revoked it first
    let db = mock_db()
        .append_query_results([vec![refresh_token_model(Uuid::now_v7())]])
        .append_exec_results([exec_result(0)]);
    let (pool, conn) = logged_pool(db);
    let app = create_test_app_with(pool, config, video_host).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .cookie(Cookie::new(REFRESH_COOKIE, "acad_rt_already-rotated"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
    assert!(resp.response().cookies().next().is_none());

    let sql = executed_sql(conn);
    assert!(sql.iter().all(|s| !s.starts_with(r#"INSERT INTO "refresh_tokens""#)));
}

#[actix_rt::test]
async fn test_role_change_revokes_refresh_tokens() {
    let target = Uuid::now_v7();
    let db = mock_db()
        .append_query_results([
            vec![user_model(target, UserRole::Moderator)],
            vec![user_model(target, UserRole::Member)],
        ])
        .append_exec_results([exec_result(2)]);
    let (pool, conn) = logged_pool(db);
    let app = create_test_app(pool).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/users/{}/role", target))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Admin))
        .set_json(json!({ "role": "member" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["role"], "member");

    let sql = executed_sql(conn);
    assert!(sql.iter().any(|s| {
        s.starts_with(r#"UPDATE "refresh_tokens""#) && s.contains("revoked_at")
    }));
}
