//! Mux implementation of [`VideoHostService`].
//!
//! - Asset metadata: `GET {api_url}/video/v1/assets/{id}` with HTTP basic auth
//! - Captions: `GET {stream_url}/{playback_id}/text/{track_id}.vtt`
//! - Thumbnails: `GET {image_url}/{playback_id}/thumbnail.jpg?time={secs}`

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CaptionTrack, TranscriptCue, VideoAsset, VideoHostError, VideoHostService, webvtt};
use crate::config::MuxSettings;
use crate::error::{AppError, AppResult};
use crate::models::VideoHostKind;

const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

pub struct MuxVideoHost {
    client: reqwest::Client,
    token_id: Option<String>,
    token_secret: Option<SecretString>,
    api_url: String,
    stream_url: String,
    image_url: String,
}

impl MuxVideoHost {
    pub fn new(settings: &MuxSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::External(format!("Failed to build Mux HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token_id: settings.token_id.clone(),
            token_secret: settings.token_secret.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            stream_url: settings.stream_url.trim_end_matches('/').to_string(),
            image_url: settings.image_url.trim_end_matches('/').to_string(),
        })
    }

    fn credentials(&self) -> Result<(&str, &SecretString), VideoHostError> {
        match (&self.token_id, &self.token_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret)),
            _ => {
                warn!("Mux credentials are not configured");
                Err(VideoHostError::AuthenticationFailed)
            }
        }
    }
}

#[async_trait]
impl VideoHostService for MuxVideoHost {
    fn kind(&self) -> VideoHostKind {
        VideoHostKind::Mux
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<VideoAsset, VideoHostError> {
        let asset_id = asset_id.trim();
        if asset_id.is_empty() || asset_id.contains('/') {
            return Err(VideoHostError::AssetNotFound);
        }

        let (token_id, token_secret) = self.credentials()?;
        let url = format!(
            "{}/video/v1/assets/{}",
            self.api_url,
            urlencoding::encode(asset_id)
        );
        debug!("Fetching Mux asset {}", asset_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(token_id, Some(token_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| VideoHostError::Failed(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(VideoHostError::AssetNotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(VideoHostError::AuthenticationFailed);
            }
            s => return Err(VideoHostError::Failed(format!("Mux API returned {}", s))),
        }

        let body: AssetEnvelope = response
            .json()
            .await
            .map_err(|e| VideoHostError::Failed(format!("Invalid Mux asset response: {}", e)))?;

        Ok(body.data.into_asset())
    }

    async fn fetch_transcript(
        &self,
        asset: &VideoAsset,
    ) -> Result<Vec<TranscriptCue>, VideoHostError> {
        let playback_id = asset
            .playback_id
            .as_deref()
            .ok_or(VideoHostError::NoPlaybackId)?;
        let track = asset
            .caption_track
            .as_ref()
            .ok_or(VideoHostError::NoCaptions)?;

        let url = format!(
            "{}/{}/text/{}.vtt",
            self.stream_url,
            urlencoding::encode(playback_id),
            urlencoding::encode(&track.id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VideoHostError::Failed(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(VideoHostError::NoCaptions),
            s => return Err(VideoHostError::Failed(format!("Mux stream returned {}", s))),
        }

        let text = response
            .text()
            .await
            .map_err(|e| VideoHostError::Failed(e.to_string()))?;

        let cues = webvtt::parse(&text).map_err(|e| {
            warn!("Unparseable caption track {} for asset {}: {}", track.id, asset.id, e);
            VideoHostError::NoCaptions
        })?;

        if cues.is_empty() {
            return Err(VideoHostError::NoCaptions);
        }
        Ok(cues)
    }

    async fn fetch_thumbnail(
        &self,
        playback_id: &str,
        time_secs: u32,
    ) -> Result<Vec<u8>, VideoHostError> {
        let url = format!(
            "{}/{}/thumbnail.jpg?time={}",
            self.image_url,
            urlencoding::encode(playback_id),
            time_secs
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VideoHostError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VideoHostError::Failed(format!(
                "Mux image returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VideoHostError::Failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ============================================================================
// Mux API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    data: MuxAsset,
}

#[derive(Debug, Deserialize)]
struct MuxAsset {
    id: String,
    #[serde(default)]
    status: String,
    duration: Option<f64>,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
    #[serde(default)]
    tracks: Vec<MuxTrack>,
}

#[derive(Debug, Deserialize)]
struct MuxPlaybackId {
    id: String,
    #[serde(default)]
    policy: String,
}

#[derive(Debug, Deserialize)]
struct MuxTrack {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    status: Option<String>,
    language_code: Option<String>,
}

impl MuxAsset {
    fn into_asset(self) -> VideoAsset {
        // Prefer a public playback id; signed ids need tokens the player doesn't have
        let playback_id = self
            .playback_ids
            .iter()
            .find(|p| p.policy == "public")
            .or_else(|| self.playback_ids.first())
            .map(|p| p.id.clone());

        let ready_text: Vec<&MuxTrack> = self
            .tracks
            .iter()
            .filter(|t| t.kind == "text")
            .filter(|t| t.status.as_deref().is_none_or(|s| s == "ready"))
            .collect();
        let caption_track = ready_text
            .iter()
            .find(|t| {
                t.language_code
                    .as_deref()
                    .is_some_and(|l| l.starts_with("en"))
            })
            .or_else(|| ready_text.first())
            .map(|t| CaptionTrack {
                id: t.id.clone(),
                language_code: t.language_code.clone(),
            });

        VideoAsset {
            id: self.id,
            status: self.status,
            playback_id,
            duration_seconds: self.duration,
            caption_track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_mapping_prefers_public_playback_and_english_captions() {
        let json = r#"{
            "data": {
                "id": "asset-1",
                "status": "ready",
                "duration": 312.48,
                "playback_ids": [
                    {"id": "signed-1", "policy": "signed"},
                    {"id": "public-1", "policy": "public"}
                ],
                "tracks": [
                    {"id": "video-1", "type": "video"},
                    {"id": "text-es", "type": "text", "status": "ready", "language_code": "es"},
                    {"id": "text-en", "type": "text", "status": "ready", "language_code": "en"}
                ]
            }
        }"#;
        let envelope: AssetEnvelope = serde_json::from_str(json).unwrap();
        let asset = envelope.data.into_asset();

        assert_eq!(asset.playback_id.as_deref(), Some("public-1"));
        assert_eq!(asset.duration_seconds, Some(312.48));
        assert_eq!(asset.caption_track.unwrap().id, "text-en");
    }

    #[test]
    fn test_asset_without_ready_text_track_has_no_captions() {
        let json = r#"{"data": {"id": "a", "tracks": [
            {"id": "t", "type": "text", "status": "preparing", "language_code": "en"}
        ]}}"#;
        let envelope: AssetEnvelope = serde_json::from_str(json).unwrap();
        let asset = envelope.data.into_asset();
        assert!(asset.caption_track.is_none());
        assert!(asset.playback_id.is_none());
    }

    #[actix_rt::test]
    async fn test_missing_credentials_fail_authentication() {
        let settings = MuxSettings {
            token_id: None,
            token_secret: None,
            api_url: "http://127.0.0.1:9".to_string(),
            stream_url: "http://127.0.0.1:9".to_string(),
            image_url: "http://127.0.0.1:9".to_string(),
        };
        let host = MuxVideoHost::new(&settings).unwrap();
        assert_eq!(
            host.fetch_asset("abc").await,
            Err(VideoHostError::AuthenticationFailed)
        );
        assert_eq!(
            host.fetch_asset("  ").await,
            Err(VideoHostError::AssetNotFound)
        );
    }
}
