//! Local file storage for recipe images.
//!
//! Recipe images arrive as base64 data URLs in the JSON payload and are
//! written to the local filesystem, keyed by content hash.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Storage key (relative path under the media root).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// A decoded base64 data-URL image, not yet persisted.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME content type from the data URL.
    pub content_type: String,
    /// File extension derived from the content type.
    pub extension: &'static str,
}

/// Decode a `data:image/<fmt>;base64,<payload>` URL.
///
/// Only image media types are accepted.
pub fn decode_data_url(input: &str) -> AppResult<DecodedImage> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Validation("image must be a base64 data URL".to_string()))?;

    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| AppError::Validation("image must be base64-encoded".to_string()))?;

    let extension = match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => {
            return Err(AppError::Validation(format!(
                "unsupported image type: {other}"
            )));
        }
    };

    let data = BASE64
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("invalid base64 image data: {e}")))?;

    if data.is_empty() {
        return Err(AppError::Validation("image data is empty".to_string()));
    }

    Ok(DecodedImage {
        data,
        content_type: content_type.to_string(),
        extension,
    })
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredImage>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredImage> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredImage {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

/// Generate a content-addressed storage key for image data.
#[must_use]
pub fn generate_storage_key(data: &[u8], extension: &str) -> String {
    let digest = md5::compute(data);
    format!("recipes/{digest:x}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url_png() {
        // 1x1 transparent PNG, truncated payload is still valid base64
        let url = "data:image/png;base64,iVBORw0KGgo=";
        let img = decode_data_url(url).unwrap();
        assert_eq!(img.content_type, "image/png");
        assert_eq!(img.extension, "png");
        assert!(!img.data.is_empty());
    }

    #[test]
    fn test_decode_rejects_missing_prefix() {
        assert!(decode_data_url("iVBORw0KGgo=").is_err());
    }

    #[test]
    fn test_decode_rejects_non_image() {
        assert!(decode_data_url("data:text/plain;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_storage_key_is_content_addressed() {
        let k1 = generate_storage_key(b"abc", "png");
        let k2 = generate_storage_key(b"abc", "png");
        let k3 = generate_storage_key(b"abd", "png");
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert!(k1.starts_with("recipes/"));
        assert!(k1.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("foodbook-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/media".to_string());

        let stored = storage
            .upload("recipes/test.png", b"fake-image", "image/png")
            .await
            .unwrap();
        assert_eq!(stored.url, "/media/recipes/test.png");
        assert_eq!(stored.size, 10);
        assert!(storage.exists("recipes/test.png").await.unwrap());

        storage.delete("recipes/test.png").await.unwrap();
        assert!(!storage.exists("recipes/test.png").await.unwrap());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
