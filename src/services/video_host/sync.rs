//! Pull a lesson's video metadata, captions and thumbnail from the host.

use tracing::{info, warn};

use super::{TranscriptCue, VideoHostError, VideoHostService};
use crate::db::DbPool;
use crate::db::lessons::VideoSyncUpdate;
use crate::entity::lesson;
use crate::error::{AppError, AppResult};
use crate::services::storage::Storage;

/// Result of a successful sync.
#[derive(Debug)]
pub struct SyncOutcome {
    pub lesson: lesson::Model,
    pub transcript_lines: usize,
    pub thumbnail_updated: bool,
}

/// Fetch asset → require playback id → fetch captions → fetch thumbnail →
/// persist everything and replace the transcript in one transaction.
///
/// A thumbnail failure is logged and skipped; every other failure aborts
/// before anything is written.
pub async fn sync_lesson_video(
    pool: &DbPool,
    storage: &Storage,
    host: &dyn VideoHostService,
    lesson: &lesson::Model,
) -> AppResult<SyncOutcome> {
    let asset_id = lesson
        .asset_id
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::field("asset_id", "An asset ID is required to sync the video"))?;

    let asset = host.fetch_asset(asset_id).await?;
    let playback_id = asset
        .playback_id
        .clone()
        .ok_or(VideoHostError::NoPlaybackId)?;
    let cues = normalize_cues(host.fetch_transcript(&asset).await?);
    if cues.is_empty() {
        return Err(VideoHostError::NoCaptions.into());
    }

    let duration_seconds = asset
        .duration_seconds
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as i32);

    let generated_key = Storage::lesson_video_thumbnail_key(lesson.id);
    let has_custom_thumbnail = lesson
        .thumbnail_key
        .as_deref()
        .is_some_and(|k| k != generated_key);

    let mut thumbnail_key = None;
    if !has_custom_thumbnail {
        let time_secs = thumbnail_time(duration_seconds);
        match host.fetch_thumbnail(&playback_id, time_secs).await {
            Ok(bytes) => {
                storage
                    .put(&generated_key, bytes, Some("image/jpeg"))
                    .await?;
                thumbnail_key = Some(generated_key);
            }
            Err(e) => warn!("Skipping thumbnail for lesson {}: {}", lesson.id, e),
        }
    }

    let thumbnail_updated = thumbnail_key.is_some();
    let transcript_lines = cues.len();
    let updated = pool
        .store_video_sync(
            lesson.id,
            VideoSyncUpdate {
                playback_id,
                duration_seconds,
                thumbnail_key,
                cues,
            },
        )
        .await?;

    info!(
        "Synced video for lesson {} (asset={}, {} transcript lines)",
        lesson.id, asset_id, transcript_lines
    );

    Ok(SyncOutcome {
        lesson: updated,
        transcript_lines,
        thumbnail_updated,
    })
}

/// A frame a quarter of the way in avoids black title cards.
fn thumbnail_time(duration_seconds: Option<i32>) -> u32 {
    duration_seconds
        .map(|d| (d.max(0) / 4) as u32)
        .unwrap_or(0)
}

/// Order cues by start time and collapse whitespace.
fn normalize_cues(mut cues: Vec<TranscriptCue>) -> Vec<TranscriptCue> {
    cues.sort_by_key(|c| (c.start_ms, c.end_ms));
    for cue in &mut cues {
        cue.text = cue.text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    cues.retain(|c| !c.text.is_empty());
    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_time() {
        assert_eq!(thumbnail_time(None), 0);
        assert_eq!(thumbnail_time(Some(3)), 0);
        assert_eq!(thumbnail_time(Some(400)), 100);
    }

    #[test]
    fn test_normalize_cues_sorts_and_trims() {
        let cues = vec![
            TranscriptCue {
                start_ms: 2000,
                end_ms: 3000,
                text: "second   line".to_string(),
            },
            TranscriptCue {
                start_ms: 0,
                end_ms: 1000,
                text: " first ".to_string(),
            },
            TranscriptCue {
                start_ms: 4000,
                end_ms: 5000,
                text: "   ".to_string(),
            },
        ];
        let normalized = normalize_cues(cues);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].text, "first");
        assert_eq!(normalized[1].text, "second line");
    }
}
