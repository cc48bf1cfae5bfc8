//! S3-compatible storage client.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Remote storage collaborator used by the upload gate.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a local file under `key`, returning its remote URL.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str)
        -> StorageResult<String>;
}

/// Storage key for a new message asset.
pub fn message_asset_key() -> String {
    format!("messages/{}.mp4", Uuid::new_v4())
}

/// Configuration for the S3-compatible store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2-style endpoints)
    pub region: String,
    /// Public base URL assets are served from
    pub public_base_url: String,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("MEDIA_STORE_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("MEDIA_STORE_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("MEDIA_STORE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("MEDIA_STORE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("MEDIA_STORE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("MEDIA_STORE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("MEDIA_STORE_BUCKET")
                .map_err(|_| StorageError::config_error("MEDIA_STORE_BUCKET not set"))?,
            region: std::env::var("MEDIA_STORE_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("MEDIA_STORE_PUBLIC_URL")
                .map_err(|_| StorageError::config_error("MEDIA_STORE_PUBLIC_URL not set"))?,
        })
    }
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    /// Create a new store from configuration.
    pub fn new(config: StoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vmsg",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StoreConfig::from_env()?))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        if key.is_empty() || key.contains("..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = self.public_url(key);
        info!("Uploaded {} to {}", path.display(), url);
        Ok(url)
    }
}
