//! Lesson video sync through the admin endpoint with an in-memory host.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use academy_lib::entity::{lesson_instructor, lesson_tag};
use academy_lib::models::{UserRole, VideoHostKind};
use academy_lib::services::video_host::{
    CaptionTrack, TranscriptCue, VideoAsset, VideoHostError, VideoHostService,
};
use actix_web::test;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::test_helpers::*;

/// Serves one fixed asset, or fails every asset lookup with `error`.
struct FakeHost {
    error: Option<VideoHostError>,
    thumbnail_calls: AtomicUsize,
}

impl FakeHost {
    fn serving() -> Arc<Self> {
        Arc::new(Self {
            error: None,
            thumbnail_calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: VideoHostError) -> Arc<Self> {
        Arc::new(Self {
            error: Some(error),
            thumbnail_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VideoHostService for FakeHost {
    fn kind(&self) -> VideoHostKind {
        VideoHostKind::Mux
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<VideoAsset, VideoHostError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(VideoAsset {
            id: asset_id.to_string(),
            status: "ready".to_string(),
            playback_id: Some("fresh-playback".to_string()),
            duration_seconds: Some(95.6),
            caption_track: Some(CaptionTrack {
                id: "track-en".to_string(),
                language_code: Some("en".to_string()),
            }),
        })
    }

    async fn fetch_transcript(
        &self,
        _asset: &VideoAsset,
    ) -> Result<Vec<TranscriptCue>, VideoHostError> {
        Ok(vec![
            TranscriptCue {
                start_ms: 1_000,
                end_ms: 2_000,
                text: "Second  cue".to_string(),
            },
            TranscriptCue {
                start_ms: 0,
                end_ms: 1_000,
                text: "First cue".to_string(),
            },
        ])
    }

    async fn fetch_thumbnail(
        &self,
        _playback_id: &str,
        _time_secs: u32,
    ) -> Result<Vec<u8>, VideoHostError> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xD8, 0xFF])
    }
}

#[actix_rt::test]
async fn test_missing_asset_maps_to_editor_message() {
    let lesson = lesson_model(Uuid::now_v7());
    let db = mock_db().append_query_results([vec![lesson.clone()]]);
    let app = create_test_app_with(
        pool_from(db),
        test_config(),
        FakeHost::failing(VideoHostError::AssetNotFound),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/lessons/{}/sync", lesson.id))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["asset_id"][0],
        VideoHostError::AssetNotFound.user_message()
    );
}

#[actix_rt::test]
async fn test_sync_replaces_transcript_and_keeps_custom_thumbnail() {
    let mut lesson = lesson_model(Uuid::now_v7());
    lesson.thumbnail_key = Some(format!("lessons/{}/thumbnail-custom.png", lesson.id));
    let mut synced = lesson.clone();
    synced.playback_id = Some("fresh-playback".to_string());
    synced.duration_seconds = Some(96);

    let db = mock_db()
        .append_query_results([vec![lesson.clone()], vec![lesson.clone()], vec![synced]])
        .append_query_results([vec![count_row(2)]])
        .append_query_results([Vec::<lesson_tag::Model>::new()])
        .append_query_results([Vec::<lesson_instructor::Model>::new()])
        .append_exec_results([exec_result(7), exec_result(2)]);
    let (pool, conn) = logged_pool(db);
    let host = FakeHost::serving();
    let app = create_test_app_with(pool, test_config(), host.clone()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/lessons/{}/sync", lesson.id))
        .cookie(session_cookie(Uuid::now_v7(), UserRole::Admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transcript_lines"], 2);
    assert_eq!(body["thumbnail_updated"], false);
    assert_eq!(body["lesson"]["playback_id"], "fresh-playback");
    assert!(
        body["lesson"]["thumbnail_url"]
            .as_str()
            .is_some_and(|url| url.ends_with("thumbnail-custom.png"))
    );
    assert_eq!(host.thumbnail_calls.load(Ordering::SeqCst), 0);

    let sql = executed_sql(conn);
    let delete = sql
        .iter()
        .position(|s| s.starts_with(r#"DELETE FROM "transcript_lines""#))
        .expect("old transcript deleted");
    let insert = sql
        .iter()
        .position(|s| s.starts_with(r#"INSERT INTO "transcript_lines""#))
        .expect("new transcript inserted");
    assert!(delete < insert);
}
