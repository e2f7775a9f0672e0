//! Lesson progress endpoints and the course roll-up.

use academy_lib::entity::lesson_user;
use academy_lib::models::UserRole;
use actix_web::test;
use serde_json::Value;
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_completing_last_lesson_completes_course() {
    let learner = Uuid::now_v7();
    let course = course_model();
    let lesson = lesson_model(course.id);
    let started = lesson_user_model(learner, lesson.id, false);
    let mut done = started.clone();
    done.completed_at = Some(chrono::Utc::now());
    let enrollment = course_user_model(learner, course.id, false);
    let mut finished = enrollment.clone();
    finished.completed_at = Some(chrono::Utc::now());

    let db = mock_db()
        .append_query_results([vec![lesson.clone()]])
        .append_query_results([vec![course.clone()]])
        .append_query_results([vec![started]])
        .append_query_results([vec![enrollment.clone()]])
        .append_query_results([vec![done]])
        .append_query_results([vec![id_row("id", lesson.id)]])
        .append_query_results([vec![id_row("lesson_id", lesson.id)]])
        .append_query_results([vec![enrollment]])
        .append_query_results([vec![finished.clone()]])
        .append_query_results([vec![id_row("id", lesson.id)]])
        .append_query_results([vec![id_row("lesson_id", lesson.id)]])
        .append_query_results([vec![finished]]);
    let (pool, conn) = logged_pool(db);
    let app = create_test_app(pool).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/lessons/{}/complete", lesson.id))
        .cookie(session_cookie(learner, UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["lesson"]["completed_at"].is_string());
    assert_eq!(body["course"]["percentage"], 100);

    let sql = executed_sql(conn);
    assert!(
        sql.iter()
            .any(|s| s.starts_with(r#"UPDATE "course_users""#) && s.contains("completed_at"))
    );
}

#[actix_rt::test]
async fn test_partial_completion_leaves_course_open() {
    let learner = Uuid::now_v7();
    let course = course_model();
    let lesson = lesson_model(course.id);
    let other_lesson = Uuid::now_v7();
    let started = lesson_user_model(learner, lesson.id, false);
    let mut done = started.clone();
    done.completed_at = Some(chrono::Utc::now());
    let enrollment = course_user_model(learner, course.id, false);

    let db = mock_db()
        .append_query_results([vec![lesson.clone()]])
        .append_query_results([vec![course.clone()]])
        .append_query_results([vec![started]])
        .append_query_results([vec![enrollment.clone()]])
        .append_query_results([vec![done]])
        .append_query_results([vec![id_row("id", lesson.id), id_row("id", other_lesson)]])
        .append_query_results([vec![id_row("lesson_id", lesson.id)]])
        .append_query_results([vec![id_row("id", lesson.id), id_row("id", other_lesson)]])
        .append_query_results([vec![id_row("lesson_id", lesson.id)]])
        .append_query_results([vec![enrollment]]);
    let (pool, conn) = logged_pool(db);
    let app = create_test_app(pool).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/lessons/{}/complete", lesson.id))
        .cookie(session_cookie(learner, UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["course"]["percentage"], 50);
    assert!(body["course"]["completed_at"].is_null());

    let sql = executed_sql(conn);
    assert!(sql.iter().all(|s| !s.starts_with(r#"UPDATE "course_users""#)));
}

#[actix_rt::test]
async fn test_concurrent_start_reuses_existing_row() {
    let learner = Uuid::now_v7();
    let course = course_model();
    let lesson = lesson_model(course.id);
    let winner = lesson_user_model(learner, lesson.id, false);

    // The insert affects no rows: another request created the record first
    let db = mock_db()
        .append_query_results([vec![lesson.clone()]])
        .append_query_results([vec![course.clone()]])
        .append_query_results([Vec::<lesson_user::Model>::new()])
        .append_query_results([vec![winner.clone()]])
        .append_query_results([vec![course_user_model(learner, course.id, false)]])
        .append_query_results([vec![id_row("id", lesson.id)]])
        .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
        .append_query_results([vec![course_user_model(learner, course.id, false)]])
        .append_exec_results([exec_result(0)]);
    let (pool, conn) = logged_pool(db);
    let app = create_test_app(pool).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/lessons/{}/start", lesson.id))
        .cookie(session_cookie(learner, UserRole::Member))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["lesson"]["lesson_id"], lesson.id.to_string());
    assert_eq!(body["course"]["percentage"], 0);

    let sql = executed_sql(conn);
    assert!(sql.iter().any(|s| {
        s.starts_with(r#"INSERT INTO "lesson_users""#)
            && s.contains(r#"ON CONFLICT ("user_id", "lesson_id") DO NOTHING"#)
    }));
}
