//! In-memory object storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_key, ObjectReader, ObjectStorage, UploadedPart};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

#[derive(Debug)]
struct PendingUpload {
    key: String,
    content_type: String,
    parts: BTreeMap<i32, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: RwLock<HashMap<String, StoredObject>>,
    uploads: RwLock<HashMap<String, PendingUpload>>,
    next_upload: AtomicU64,
    fail_uploads: AtomicBool,
}

/// Object storage held in process memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail (or succeed again).
    pub fn set_fail_uploads(&self, fail: bool) {
        self.inner.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Store an object directly.
    pub async fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>, content_type: &str) {
        self.inner.objects.write().await.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    /// Object bytes, if present.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.objects.read().await.get(key).map(|o| o.data.clone())
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.inner
            .objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check_uploads_allowed(&self, key: &str) -> StorageResult<()> {
        if self.inner.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!("{}: uploads disabled", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, mut body: ObjectReader, content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.check_uploads_allowed(key)?;
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        self.put(key, data, content_type).await;
        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<ObjectReader> {
        validate_key(key)?;
        let data = self.get(key).await.ok_or_else(|| StorageError::not_found(key))?;
        Ok(Box::pin(std::io::Cursor::new(data)))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.inner.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.inner.objects.read().await.contains_key(key))
    }

    async fn presigned_put(&self, key: &str, expiry: Duration) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!("memory://{}?method=PUT&expires={}", key, expiry.as_secs()))
    }

    async fn presigned_get(&self, key: &str, expiry: Duration) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!("memory://{}?method=GET&expires={}", key, expiry.as_secs()))
    }

    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        self.check_uploads_allowed(key)?;
        let id = format!("upload-{}", self.inner.next_upload.fetch_add(1, Ordering::SeqCst) + 1);
        self.inner.uploads.write().await.insert(
            id.clone(),
            PendingUpload {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> StorageResult<UploadedPart> {
        if part_number < 1 {
            return Err(StorageError::multipart_failed(format!(
                "part number must be >= 1, got {}",
                part_number
            )));
        }
        let mut uploads = self.inner.uploads.write().await;
        let upload = uploads
            .get_mut(upload_id)
            .filter(|u| u.key == key)
            .ok_or_else(|| StorageError::multipart_failed(format!("unknown upload {} for {}", upload_id, key)))?;
        let etag = format!("\"{}-{}\"", part_number, body.len());
        upload.parts.insert(part_number, body);
        Ok(UploadedPart { part_number, etag })
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> StorageResult<()> {
        let upload = {
            let mut uploads = self.inner.uploads.write().await;
            match uploads.get(upload_id) {
                Some(u) if u.key == key => uploads.remove(upload_id),
                _ => None,
            }
        }
        .ok_or_else(|| StorageError::multipart_failed(format!("unknown upload {} for {}", upload_id, key)))?;

        let mut data = Vec::new();
        let mut wanted: Vec<i32> = parts.iter().map(|p| p.part_number).collect();
        wanted.sort_unstable();
        for number in wanted {
            let part = upload
                .parts
                .get(&number)
                .ok_or_else(|| StorageError::multipart_failed(format!("missing part {} for {}", number, key)))?;
            data.extend_from_slice(part);
        }
        self.put(key, data, &upload.content_type).await;
        Ok(())
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StorageResult<()> {
        let mut uploads = self.inner.uploads.write().await;
        if uploads.get(upload_id).is_some_and(|u| u.key == key) {
            uploads.remove(upload_id);
        }
        Ok(())
    }
}
