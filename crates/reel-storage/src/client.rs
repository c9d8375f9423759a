//! S3-compatible client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_key, ObjectReader, ObjectStorage, UploadedPart};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Endpoint embedded in presigned URLs, when clients reach storage
    /// through a different host than workers
    pub public_endpoint_url: Option<String>,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Path-style addressing (required by MinIO and R2)
    pub force_path_style: bool,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| StorageError::config_error(format!("{} not set", name)))
        };
        Ok(Self {
            endpoint_url: required("S3_ENDPOINT")?,
            public_endpoint_url: std::env::var("S3_PUBLIC_ENDPOINT").ok().filter(|s| !s.is_empty()),
            access_key_id: required("S3_ACCESS_KEY_ID")?,
            secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
            bucket_name: required("S3_BUCKET")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
            force_path_style: std::env::var("S3_USE_PATH_STYLE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    presign_client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let build = |endpoint: &str| {
            let credentials = Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                "reel-storage",
            );
            let sdk_config = Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(Region::new(config.region.clone()))
                .credentials_provider(credentials)
                .force_path_style(config.force_path_style)
                .build();
            Client::from_conf(sdk_config)
        };

        let client = build(&config.endpoint_url);
        let presign_client = match &config.public_endpoint_url {
            Some(public) => build(public),
            None => client.clone(),
        };

        Self {
            client,
            presign_client,
            bucket: config.bucket_name,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_body(&self, key: &str, body: ByteStream, content_type: &str) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", key, e)))?;
        Ok(())
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    async fn upload(&self, key: &str, mut body: ObjectReader, content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        debug!("Uploading {} bytes to {}", data.len(), key);
        self.put_body(key, ByteStream::from(data), content_type).await
    }

    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;
        self.put_body(key, body, content_type).await?;
        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<ObjectReader> {
        validate_key(key)?;
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetObjectError::NoSuchKey(_)) => StorageError::not_found(key),
                _ => StorageError::download_failed(format!("{}: {}", key, e)),
            })?;

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        debug!("Deleting {}", key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(format!("{}: {}", key, e)))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.as_service_error() {
                Some(HeadObjectError::NotFound(_)) => Ok(false),
                _ => Err(StorageError::AwsSdk(e.to_string())),
            },
        }
    }

    async fn presigned_put(&self, key: &str, expiry: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let presign_config =
            PresigningConfig::expires_in(expiry).map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        let presigned = self
            .presign_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    async fn presigned_get(&self, key: &str, expiry: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let presign_config =
            PresigningConfig::expires_in(expiry).map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        let presigned = self
            .presign_client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(format!("create {}: {}", key, e)))?;

        output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::multipart_failed(format!("create {}: no upload id returned", key)))
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> StorageResult<UploadedPart> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(format!("part {} of {}: {}", part_number, key, e)))?;

        let etag = output.e_tag().map(str::to_string).ok_or_else(|| {
            StorageError::multipart_failed(format!("part {} of {}: no etag returned", part_number, key))
        })?;
        Ok(UploadedPart { part_number, etag })
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<UploadedPart>,
    ) -> StorageResult<()> {
        parts.sort_by_key(|p| p.part_number);
        let completed: Vec<CompletedPart> = parts
            .into_iter()
            .map(|p| CompletedPart::builder().part_number(p.part_number).e_tag(p.etag).build())
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(completed)).build())
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(format!("complete {}: {}", key, e)))?;

        info!("Completed multipart upload {} for {}", upload_id, key);
        Ok(())
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| StorageError::multipart_failed(format!("abort {}: {}", key, e)))?;
        Ok(())
    }
}
