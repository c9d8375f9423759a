//! The object storage capability.

use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Streamed object body.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// A part accepted by a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub etag: String,
}

/// Reject keys that are empty, absolute or contain parent segments.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Object storage as consumed by workers.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, body: ObjectReader, content_type: &str) -> StorageResult<()>;

    /// Stream the object at `key`.
    async fn download(&self, key: &str) -> StorageResult<ObjectReader>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Signed URL a client can PUT to.
    async fn presigned_put(&self, key: &str, expiry: Duration) -> StorageResult<String>;

    /// Signed URL a client can GET from.
    async fn presigned_get(&self, key: &str, expiry: Duration) -> StorageResult<String>;

    /// Start a multipart upload and return its upload id.
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StorageResult<String>;

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> StorageResult<UploadedPart>;

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> StorageResult<()>;

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StorageResult<()>;

    /// Upload a local file.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), key);
        let file = tokio::fs::File::open(path).await?;
        self.upload(key, Box::pin(file), content_type).await
    }

    /// Download an object to a local file, creating parent directories.
    /// Returns the number of bytes written.
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<u64> {
        debug!("Downloading {} to {}", key, path.display());
        let mut reader = self.download(key).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StorageError::download_failed(format!("{}: {}", key, e)))?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("renders/clip-1/output.mp4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("renders/../secrets").is_err());
    }
}
