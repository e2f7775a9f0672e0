//! Video host abstraction.
//!
//! The platform never stores or encodes video. Lessons keep a reference
//! (asset id, playback id) and pull metadata, captions and a thumbnail from
//! the provider on demand.

use async_trait::async_trait;

use crate::models::VideoHostKind;

mod mux;
mod sync;
pub mod webvtt;

pub use mux::MuxVideoHost;
pub use sync::{SyncOutcome, sync_lesson_video};

/// Provider failure. Each variant carries a fixed message safe to show editors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoHostError {
    #[error("asset not found")]
    AssetNotFound,

    #[error("authentication with the video host failed")]
    AuthenticationFailed,

    #[error("asset has no playback id")]
    NoPlaybackId,

    #[error("asset has no captions")]
    NoCaptions,

    #[error("video host request failed: {0}")]
    Failed(String),
}

impl VideoHostError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AssetNotFound => {
                "The video could not be found. Check the asset ID and try again."
            }
            Self::AuthenticationFailed => {
                "The video host rejected our credentials. Check the access token settings."
            }
            Self::NoPlaybackId => {
                "The video has no playback ID yet. Add a public playback ID and sync again."
            }
            Self::NoCaptions => {
                "The video has no captions yet. Generate captions on the video host and sync again."
            }
            Self::Failed(_) => "The video host could not be reached. Please try again later.",
        }
    }
}

/// Asset metadata the platform cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    pub id: String,
    pub status: String,
    pub playback_id: Option<String>,
    pub duration_seconds: Option<f64>,
    pub caption_track: Option<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub id: String,
    pub language_code: Option<String>,
}

/// One transcript cue with millisecond timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptCue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

#[async_trait]
pub trait VideoHostService: Send + Sync {
    fn kind(&self) -> VideoHostKind;

    async fn fetch_asset(&self, asset_id: &str) -> Result<VideoAsset, VideoHostError>;

    async fn fetch_transcript(
        &self,
        asset: &VideoAsset,
    ) -> Result<Vec<TranscriptCue>, VideoHostError>;

    /// JPEG still of the video at `time_secs`.
    async fn fetch_thumbnail(
        &self,
        playback_id: &str,
        time_secs: u32,
    ) -> Result<Vec<u8>, VideoHostError>;
}
