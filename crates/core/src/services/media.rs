//! Image upload service.

use std::sync::Arc;

use riviu_common::{
    AppError, AppResult, StorageBackend, UploadedFile, format_file_size, generate_storage_key,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Gif => "image/gif",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Gif => "gif",
        }
    }

    /// Detect format from a MIME type, ignoring parameters and case.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/avif" => Some(Self::Avif),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Result of an upload, as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

impl From<UploadedFile> for UploadedImage {
    fn from(file: UploadedFile) -> Self {
        Self {
            key: file.key,
            url: file.url,
            size: file.size,
            content_type: file.content_type,
        }
    }
}

/// Media service for image uploads.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
    max_bytes: u64,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, max_bytes: u64) -> Self {
        Self { storage, max_bytes }
    }

    /// Largest accepted upload, in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store an image and return its public URL.
    pub async fn upload_image(
        &self,
        user_id: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<UploadedImage> {
        let size = data.len() as u64;
        if size > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File is {}, the limit is {}",
                format_file_size(size),
                format_file_size(self.max_bytes)
            )));
        }
        if data.is_empty() {
            return Err(AppError::Validation("file: must not be empty".to_string()));
        }

        let format = ImageFormat::from_mime_type(content_type).ok_or_else(|| {
            AppError::Validation(format!("file: {content_type} is not a supported image type"))
        })?;

        let key = generate_storage_key(user_id, &format!("image.{}", format.extension()));
        let file = self.storage.upload(&key, data, format.mime_type()).await?;
        info!(user_id = %user_id, key = %file.key, size = file.size, "Image uploaded");

        Ok(file.into())
    }

    /// Remove a stored image.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.storage.delete(key).await
    }
}
