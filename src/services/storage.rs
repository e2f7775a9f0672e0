//! S3 storage for uploaded and fetched images.
//!
//! Supports both AWS S3 and MinIO for development.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use tracing::info;
use uuid::Uuid;

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    /// Create a new S3 storage client and make sure the bucket exists.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let storage = Self::from_settings(config);

        // Verify bucket exists or create it
        storage.ensure_bucket_exists().await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(storage)
    }

    /// Build the client without touching the network.
    pub fn from_settings(config: &StorageSettings) -> Self {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "academy");

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        // Use custom endpoint for MinIO in development
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("S3 bucket '{}' exists", self.bucket);
                Ok(())
            }
            Err(e) => {
                // Check if it's a "not found" error
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    info!("S3 bucket '{}' created", self.bucket);
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }

    /// Get the content type for an image file based on its extension.
    pub fn content_type_for_extension(ext: &str) -> &'static str {
        match ext.to_lowercase().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "avif" => "image/avif",
            _ => "application/octet-stream",
        }
    }

    /// File extension for an accepted image content type.
    pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
        match content_type {
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            "image/avif" => Some("avif"),
            _ => None,
        }
    }

    /// Upload an object.
    pub async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file to S3: {}", e)))?;

        Ok(())
    }

    /// Fetch an object's bytes and stored content type.
    pub async fn get(&self, key: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("File not found: {}", key))
                } else {
                    AppError::Storage(format!("Failed to get file from S3: {}", service_error))
                }
            })?;

        let content_type = response.content_type().map(String::from);
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok((data, content_type))
    }

    /// Delete an object. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file from S3: {}", e)))?;

        Ok(())
    }

    /// Key for a course thumbnail: courses/{course_id}/thumbnail-{id}.{ext}
    pub fn course_thumbnail_key(course_id: Uuid, ext: &str) -> String {
        format!("courses/{}/thumbnail-{}.{}", course_id, Uuid::now_v7(), ext)
    }

    /// Key for a lesson thumbnail: lessons/{lesson_id}/thumbnail-{id}.{ext}
    pub fn lesson_thumbnail_key(lesson_id: Uuid, ext: &str) -> String {
        format!("lessons/{}/thumbnail-{}.{}", lesson_id, Uuid::now_v7(), ext)
    }

    /// Key for a thumbnail pulled from the video host.
    pub fn lesson_video_thumbnail_key(lesson_id: Uuid) -> String {
        format!("lessons/{}/video-thumbnail.jpg", lesson_id)
    }

    /// Key for a showcase image: showcases/{showcase_id}/{image_id}.{ext}
    pub fn showcase_image_key(showcase_id: Uuid, image_id: Uuid, ext: &str) -> String {
        format!("showcases/{}/{}.{}", showcase_id, image_id, ext)
    }

    /// Whether a key may be served through the public files proxy.
    pub fn is_public_key(key: &str) -> bool {
        const PREFIXES: [&str; 3] = ["courses/", "lessons/", "showcases/"];
        !key.contains("..")
            && !key.contains("//")
            && PREFIXES
                .iter()
                .any(|p| key.starts_with(p) && key.len() > p.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_keys() {
        let id = Uuid::nil();
        let key = Storage::course_thumbnail_key(id, "png");
        assert!(key.starts_with("courses/00000000-0000-0000-0000-000000000000/thumbnail-"));
        assert!(key.ends_with(".png"));

        assert_eq!(
            Storage::lesson_video_thumbnail_key(id),
            "lessons/00000000-0000-0000-0000-000000000000/video-thumbnail.jpg"
        );
        assert_eq!(
            Storage::showcase_image_key(id, id, "webp"),
            "showcases/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000000.webp"
        );
    }

    #[test]
    fn test_public_key_prefixes() {
        assert!(Storage::is_public_key("courses/abc/thumbnail-1.png"));
        assert!(Storage::is_public_key("showcases/abc/def.jpg"));
        assert!(!Storage::is_public_key("courses/"));
        assert!(!Storage::is_public_key("private/backup.sql"));
        assert!(!Storage::is_public_key("courses/../private/x"));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(Storage::content_type_for_extension("PNG"), "image/png");
        assert_eq!(Storage::content_type_for_extension("jpeg"), "image/jpeg");
        assert_eq!(
            Storage::content_type_for_extension("html"),
            "application/octet-stream"
        );
        assert_eq!(Storage::extension_for_content_type("image/webp"), Some("webp"));
        assert_eq!(Storage::extension_for_content_type("text/html"), None);
    }
}
