//! Mux client against the mock server.

use academy_lib::models::VideoHostKind;
use academy_lib::services::video_host::{MuxVideoHost, VideoHostError, VideoHostService};

use super::mock_mux::{MockMux, THUMBNAIL};
use super::test_helpers::mux_settings;

fn client(mock: &MockMux) -> MuxVideoHost {
    MuxVideoHost::new(&mux_settings(&mock.base_url)).expect("failed to build Mux client")
}

#[actix_rt::test]
async fn test_fetch_asset_prefers_public_playback_and_english_captions() {
    let mock = MockMux::start();
    let host = client(&mock);
    assert_eq!(host.kind(), VideoHostKind::Mux);

    let asset = host.fetch_asset("asset-ok").await.expect("asset");
    assert_eq!(asset.id, "asset-ok");
    assert_eq!(asset.playback_id.as_deref(), Some("public-playback"));
    assert_eq!(asset.duration_seconds, Some(312.4));

    let track = asset.caption_track.as_ref().expect("caption track");
    assert_eq!(track.id, "track-en");
    assert_eq!(track.language_code.as_deref(), Some("en-US"));
}

#[actix_rt::test]
async fn test_fetch_transcript_parses_cues() {
    let mock = MockMux::start();
    let host = client(&mock);

    let asset = host.fetch_asset("asset-ok").await.expect("asset");
    let cues = host.fetch_transcript(&asset).await.expect("captions");

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].start_ms, 0);
    assert_eq!(cues[0].end_ms, 2_500);
    assert_eq!(cues[0].text, "Welcome to the course.");
    assert_eq!(cues[1].start_ms, 2_500);
    assert_eq!(cues[1].text, "Today we look at contracts.");
}

#[actix_rt::test]
async fn test_fetch_thumbnail_returns_image_bytes() {
    let mock = MockMux::start();
    let host = client(&mock);

    let bytes = host
        .fetch_thumbnail("public-playback", 5)
        .await
        .expect("thumbnail");
    assert_eq!(bytes, THUMBNAIL);
}

#[actix_rt::test]
async fn test_unknown_asset_maps_to_not_found() {
    let mock = MockMux::start();
    let host = client(&mock);

    let err = host.fetch_asset("does-not-exist").await.unwrap_err();
    assert_eq!(err, VideoHostError::AssetNotFound);
}

#[actix_rt::test]
async fn test_asset_without_playback_has_no_transcript() {
    let mock = MockMux::start();
    let host = client(&mock);

    let asset = host.fetch_asset("asset-no-playback").await.expect("asset");
    assert!(asset.playback_id.is_none());
    assert!(asset.caption_track.is_none());

    let err = host.fetch_transcript(&asset).await.unwrap_err();
    assert_eq!(err, VideoHostError::NoPlaybackId);
}

#[actix_rt::test]
async fn test_wrong_credentials_map_to_authentication_failed() {
    let mock = MockMux::start();
    let mut settings = mux_settings(&mock.base_url);
    settings.token_secret = Some(secrecy::SecretString::from("wrong-secret"));
    let host = MuxVideoHost::new(&settings).expect("client");

    let err = host.fetch_asset("asset-ok").await.unwrap_err();
    assert_eq!(err, VideoHostError::AuthenticationFailed);
}

#[actix_rt::test]
async fn test_missing_credentials_fail_without_a_request() {
    let mut settings = mux_settings("http://127.0.0.1:9");
    settings.token_id = None;
    let host = MuxVideoHost::new(&settings).expect("client");

    let err = host.fetch_asset("asset-ok").await.unwrap_err();
    assert_eq!(err, VideoHostError::AuthenticationFailed);
}

#[actix_rt::test]
async fn test_asset_ids_with_slashes_are_rejected() {
    let mock = MockMux::start();
    let host = client(&mock);

    let err = host.fetch_asset("../admin").await.unwrap_err();
    assert_eq!(err, VideoHostError::AssetNotFound);
}
