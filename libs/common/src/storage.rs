//! Object storage adapter backed by Amazon S3
//!
//! Uploads return the public URL of the stored object. Deletion exists so
//! callers can roll back uploads whose surrounding request failed.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Credentials},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use bytes::Bytes;
use std::env;
use tracing::{error, info};

use crate::error::{StorageError, StorageResult};

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket receiving all uploads
    pub bucket: String,
    /// AWS region of the bucket
    pub region: String,
    /// Static access key; the SDK default chain is used when absent
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom S3-compatible endpoint (path-style addressing)
    pub endpoint: Option<String>,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `S3_BUCKET_NAME`: Bucket name (required)
    /// - `AWS_REGION`: Region (default: "us-east-1")
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: Static credentials
    /// - `S3_ENDPOINT`: Custom endpoint such as a local MinIO
    pub fn from_env() -> anyhow::Result<Self> {
        let bucket = env::var("S3_BUCKET_NAME")
            .map_err(|_| anyhow::anyhow!("S3_BUCKET_NAME environment variable not set"))?;
        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            bucket,
            region,
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            endpoint: env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }

    /// Public URL under which an object key is served
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

/// Binary object store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `key` and return its public URL
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<String>;

    /// Remove the object stored under `key`
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// S3 implementation of [`ObjectStorage`]
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    config: StorageConfig,
}

impl S3Storage {
    /// Build an S3 client from the storage configuration
    pub async fn new(config: StorageConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "clipshare-env",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = S3ConfigBuilder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        info!("S3 client initialized for bucket: {}", config.bucket);

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<String> {
        info!("Uploading object to S3: {} ({} bytes)", key, body.len());

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!("S3 upload of {} failed: {}", key, DisplayErrorContext(&e));
                StorageError::Upload {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        Ok(self.config.object_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        info!("Deleting object from S3: {}", key);

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
