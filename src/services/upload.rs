//! Multipart image uploads (thumbnails and showcase images).
//!
//! Accepted form fields:
//! - `image`: the file itself (optional for crop-only updates)
//! - `crops`: JSON object of named crops from the client widget

use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::Crops;
use crate::models::crop::parse_crops;

/// Cap on non-file form fields.
const MAX_TEXT_FIELD_SIZE: usize = 16 * 1024;

/// An image read fully into memory.
#[derive(Debug)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Parsed multipart image form.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub image: Option<UploadedImage>,
    pub crops: Crops,
}

/// Detect the image format from its leading bytes.
///
/// The client-supplied content type is not trusted.
pub fn sniff_image(data: &[u8]) -> Option<(&'static str, &'static str)> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(("image/png", "png"))
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(("image/jpeg", "jpg"))
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(("image/gif", "gif"))
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(("image/webp", "webp"))
    } else if data.len() >= 12
        && &data[4..8] == b"ftyp"
        && matches!(&data[8..12], b"avif" | b"avis")
    {
        Some(("image/avif", "avif"))
    } else {
        None
    }
}

async fn read_field(field: &mut Field, limit: usize, name: &str) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::field(
                name,
                format!("The {} may not be greater than {} kilobytes", name, limit / 1024),
            ));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn drain_field(field: &mut Field) {
    while let Some(chunk) = field.next().await {
        let _ = chunk;
    }
}

/// Read an image form. Unknown fields are skipped.
pub async fn read_image_form(mut payload: Multipart, max_image_size: usize) -> AppResult<ImageForm> {
    let mut form = ImageForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(str::to_string)
            .unwrap_or_default();

        match field_name.as_str() {
            "image" => {
                let data = read_field(&mut field, max_image_size, "image").await?;
                if data.is_empty() {
                    continue;
                }
                let (content_type, extension) = sniff_image(&data).ok_or_else(|| {
                    AppError::field(
                        "image",
                        "The image must be a file of type: png, jpg, gif, webp, avif",
                    )
                })?;
                debug!("Received {} image ({} bytes)", content_type, data.len());
                form.image = Some(UploadedImage {
                    data,
                    content_type,
                    extension,
                });
            }
            "crops" => {
                let raw = read_field(&mut field, MAX_TEXT_FIELD_SIZE, "crops").await?;
                let raw = String::from_utf8(raw)
                    .map_err(|_| AppError::field("crops", "The crops field must be valid JSON"))?;
                form.crops = parse_crops(&raw)?;
            }
            other => {
                warn!("Ignoring unexpected multipart field '{}'", other);
                drain_field(&mut field).await;
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_formats() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(sniff_image(&png), Some(("image/png", "png")));
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(("image/jpeg", "jpg")));
        assert_eq!(sniff_image(b"GIF89a...."), Some(("image/gif", "gif")));
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WEBPVP8 "), Some(("image/webp", "webp")));
        assert_eq!(sniff_image(b"\0\0\0\x1cftypavif"), Some(("image/avif", "avif")));
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(sniff_image(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), None);
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
        assert_eq!(sniff_image(b""), None);
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WAVE"), None);
    }
}
