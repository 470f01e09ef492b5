//! Object storage access
//!
//! The [`ObjectStore`] trait is the seam between the retrieval worker and
//! whatever S3-compatible store the deployment points at; the worker only
//! ever sees `store`/`fetch`. The production implementation is
//! [`S3ObjectStore`]; tests and embedders can plug in their own.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error as ThisError;

mod transfer;

pub use transfer::{download_files, upload_files};

/// Errors raised by object storage operations
#[derive(Debug, ThisError)]
pub enum StorageError {
    /// Upload of one object failed
    #[error("upload of '{key}' failed: {reason}")]
    Upload {
        /// Object key
        key: String,
        /// Failure detail
        reason: String,
    },

    /// Download of one object failed
    #[error("download of '{key}' failed: {reason}")]
    Download {
        /// Object key
        key: String,
        /// Failure detail
        reason: String,
    },
}

/// Store and fetch single objects against a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload one local file under the given key
    async fn store(&self, file: &Path, key: &str) -> std::result::Result<(), StorageError>;

    /// Download one object to the given local path
    async fn fetch(&self, key: &str, destination: &Path)
    -> std::result::Result<(), StorageError>;
}

/// S3-compatible object store
///
/// The SDK client is built lazily on first use; construction (credential
/// and region resolution) is guarded by a single async mutex so concurrent
/// first users never race it. Individual transfers share the built client
/// freely — the SDK client is internally reference-counted.
pub struct S3ObjectStore {
    config: crate::config::ObsConfig,
    client: tokio::sync::Mutex<Option<aws_sdk_s3::Client>>,
}

impl S3ObjectStore {
    /// Create a store from the obs configuration; no connection is made
    /// until the first transfer
    pub fn new(config: crate::config::ObsConfig) -> Self {
        Self {
            config,
            client: tokio::sync::Mutex::new(None),
        }
    }

    /// Get or lazily build the SDK client
    async fn client(&self) -> aws_sdk_s3::Client {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return client.clone();
        }

        tracing::info!(
            region = %self.config.region,
            endpoint = ?self.config.endpoint_url,
            "Building S3 client"
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.config.region.clone()));
        if let Some(endpoint) = &self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Custom endpoints (MinIO and friends) usually require path-style keys
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.config.endpoint_url.is_some())
            .build();

        let client = aws_sdk_s3::Client::from_conf(s3_config);
        *guard = Some(client.clone());
        client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn store(&self, file: &Path, key: &str) -> std::result::Result<(), StorageError> {
        let body = aws_sdk_s3::primitives::ByteStream::from_path(file)
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                reason: format!("read {:?}: {}", file, e),
            })?;

        self.client()
            .await
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(key, file = %file.display(), "Object uploaded");
        Ok(())
    }

    async fn fetch(
        &self,
        key: &str,
        destination: &Path,
    ) -> std::result::Result<(), StorageError> {
        let response = self
            .client()
            .await
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                reason: e.to_string(),
            })?
            .into_bytes();

        tokio::fs::write(destination, &data)
            .await
            .map_err(|e| StorageError::Download {
                key: key.to_string(),
                reason: format!("write {:?}: {}", destination, e),
            })?;

        tracing::debug!(key, destination = %destination.display(), "Object downloaded");
        Ok(())
    }
}
