//! Upload policies and the generic read/validate/store path for files
//! submitted as multipart fields.

use axum::{body::Bytes, extract::multipart::Field};
use common::{error::StorageResult, storage::ObjectStorage};
use tracing::warn;

use crate::error::{ApiError, ApiResult};

const MIB: usize = 1024 * 1024;

/// Request body ceiling for upload routes: a video and a thumbnail at their
/// ceilings plus form overhead
pub const UPLOAD_BODY_LIMIT: usize = 13 * MIB;

const IMAGE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg"];

/// Constraints for one uploaded file field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Accepted MIME types, compared case-insensitively without parameters
    pub allowed_types: &'static [&'static str],
    /// Largest accepted file size in bytes
    pub max_bytes: usize,
    /// Storage key prefix
    pub prefix: &'static str,
}

pub const PROFILE_PICTURE: UploadPolicy = UploadPolicy {
    allowed_types: IMAGE_TYPES,
    max_bytes: 3 * MIB,
    prefix: "profile-pictures",
};

pub const VIDEO: UploadPolicy = UploadPolicy {
    allowed_types: &["video/mp4"],
    max_bytes: 6 * MIB,
    prefix: "uploaded-videos",
};

pub const THUMBNAIL: UploadPolicy = UploadPolicy {
    allowed_types: IMAGE_TYPES,
    max_bytes: 6 * MIB,
    prefix: "video-thumbnails",
};

/// A file fully read from a multipart field and accepted by its policy
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Where an upload ended up
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

impl UploadPolicy {
    pub fn accepts_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_types.contains(&essence.as_str())
    }

    /// Read a file field, rejecting a disallowed type up front and aborting
    /// as soon as the data crosses the size ceiling.
    pub async fn read(&self, mut field: Field<'_>) -> ApiResult<UploadedFile> {
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !self.accepts_type(&content_type) {
            return Err(ApiError::InvalidFileType);
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > self.max_bytes {
                warn!(
                    "Rejected {} upload {}: exceeds {} bytes",
                    self.prefix, file_name, self.max_bytes
                );
                return Err(ApiError::FileTooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        Ok(UploadedFile {
            file_name,
            content_type,
            data: Bytes::from(data),
        })
    }

    /// `<prefix>/<file name>-<timestamp>`, with the file name reduced to
    /// characters that are safe in a URL path segment
    pub fn object_key(&self, file_name: &str, timestamp_millis: i64) -> String {
        let safe: String = file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let safe = if safe.is_empty() { "upload".to_string() } else { safe };

        format!("{}/{}-{}", self.prefix, safe, timestamp_millis)
    }

    /// Write an accepted file to object storage under this policy's prefix
    pub async fn store(
        &self,
        storage: &dyn ObjectStorage,
        file: UploadedFile,
    ) -> StorageResult<StoredObject> {
        let key = self.object_key(&file.file_name, chrono::Utc::now().timestamp_millis());
        let url = storage.put(&key, file.data, &file.content_type).await?;
        Ok(StoredObject { key, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_policies_accept_images_only() {
        assert!(PROFILE_PICTURE.accepts_type("image/png"));
        assert!(PROFILE_PICTURE.accepts_type("image/JPEG"));
        assert!(PROFILE_PICTURE.accepts_type("image/jpeg; charset=binary"));
        assert!(!PROFILE_PICTURE.accepts_type("image/gif"));
        assert!(!PROFILE_PICTURE.accepts_type("video/mp4"));
        assert!(THUMBNAIL.accepts_type("image/jpg"));
    }

    #[test]
    fn video_policy_accepts_mp4_only() {
        assert!(VIDEO.accepts_type("video/mp4"));
        assert!(!VIDEO.accepts_type("image/png"));
        assert!(!VIDEO.accepts_type("video/quicktime"));
    }

    #[test]
    fn ceilings_and_prefixes() {
        assert_eq!(PROFILE_PICTURE.max_bytes, 3 * 1024 * 1024);
        assert_eq!(VIDEO.max_bytes, 6 * 1024 * 1024);
        assert_eq!(THUMBNAIL.max_bytes, 6 * 1024 * 1024);
        assert_ne!(VIDEO.prefix, THUMBNAIL.prefix);
        assert!(UPLOAD_BODY_LIMIT > VIDEO.max_bytes + THUMBNAIL.max_bytes);
    }

    #[test]
    fn object_key_appends_timestamp_and_sanitizes_name() {
        assert_eq!(
            PROFILE_PICTURE.object_key("me.png", 1_700_000_000_000),
            "profile-pictures/me.png-1700000000000"
        );
        assert_eq!(
            VIDEO.object_key("../my trip?.mp4", 42),
            "uploaded-videos/..-my-trip-.mp4-42"
        );
        assert_eq!(THUMBNAIL.object_key("", 7), "video-thumbnails/upload-7");
    }
}
