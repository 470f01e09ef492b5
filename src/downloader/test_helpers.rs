//! Shared fixtures for downloader tests.

use crate::config::{Config, StationConfig};
use crate::provider::{Provider, ProviderError, ProviderRegistry, RemoteProduct};
use crate::storage::{ObjectStore, StorageError};
use crate::types::{StationFamily, TimeRange};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::StationDownloader;

/// Provider driven entirely by the test script
#[derive(Debug, Default)]
pub(crate) struct ScriptedProvider {
    /// Products returned by every search
    pub(crate) products: Mutex<Vec<RemoteProduct>>,
    /// When set, download fails with this detail
    pub(crate) fail_download: Mutex<Option<String>>,
    /// Sleep inserted before the download body runs
    pub(crate) download_delay: Mutex<Duration>,
}

impl ScriptedProvider {
    pub(crate) fn set_fail_download(&self, detail: Option<&str>) {
        *self.fail_download.lock().unwrap() = detail.map(str::to_string);
    }

    pub(crate) fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.lock().unwrap() = delay;
    }

    pub(crate) fn set_products(&self, products: Vec<RemoteProduct>) {
        *self.products.lock().unwrap() = products;
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn search(
        &self,
        _range: &TimeRange,
    ) -> std::result::Result<Vec<RemoteProduct>, ProviderError> {
        Ok(self.products.lock().unwrap().clone())
    }

    async fn download(
        &self,
        product_id: &str,
        destination: &Path,
    ) -> std::result::Result<(), ProviderError> {
        let delay = *self.download_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(detail) = self.fail_download.lock().unwrap().clone() {
            return Err(ProviderError::DownloadFailed(detail));
        }

        let target = destination.join(format!("{}.raw", product_id));
        std::fs::write(&target, b"payload")
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;
        Ok(())
    }
}

/// In-memory object store for asserting uploads
#[derive(Default)]
pub(crate) struct MemoryObjectStore {
    pub(crate) objects: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) fail_uploads: AtomicBool,
}

impl MemoryObjectStore {
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn store(&self, file: &Path, key: &str) -> std::result::Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                reason: "injected upload failure".to_string(),
            });
        }
        let data = std::fs::read(file).map_err(|e| StorageError::Upload {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn fetch(
        &self,
        key: &str,
        destination: &Path,
    ) -> std::result::Result<(), StorageError> {
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::Download {
                key: key.to_string(),
                reason: "no such object".to_string(),
            })?;
        std::fs::write(destination, data).map_err(|e| StorageError::Download {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Config pointing every path at a scratch directory
///
/// Two stations are configured: "adgs" (ADGS family) and "ins" (CADIP
/// family). A test that registers no provider for one of them gets the
/// invalid-station failure path for free.
pub(crate) fn test_config(root: &Path) -> Config {
    Config {
        stations: vec![
            StationConfig {
                name: "adgs".to_string(),
                family: StationFamily::Adgs,
                base_url: "http://127.0.0.1:1/".to_string(),
                timeout: Duration::from_secs(5),
            },
            StationConfig {
                name: "ins".to_string(),
                family: StationFamily::Cadip,
                base_url: "http://127.0.0.1:1/".to_string(),
                timeout: Duration::from_secs(5),
            },
        ],
        download: crate::config::DownloadConfig {
            work_dir: root.join("work"),
            start_timeout: Duration::from_secs(3),
        },
        persistence: crate::config::PersistenceConfig {
            database_path: root.join("status.db"),
        },
        ..Default::default()
    }
}

/// Downloader over scratch storage with the given providers registered
pub(crate) async fn create_test_downloader(
    providers: Vec<(&str, std::sync::Arc<dyn Provider>)>,
) -> (
    StationDownloader,
    std::sync::Arc<MemoryObjectStore>,
    tempfile::TempDir,
) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(temp_dir.path());

    let mut registry = ProviderRegistry::new();
    for (station, provider) in providers {
        registry.register(station, provider);
    }

    let object_store = std::sync::Arc::new(MemoryObjectStore::default());
    let downloader =
        StationDownloader::with_collaborators(config, registry, object_store.clone())
            .await
            .unwrap();

    (downloader, object_store, temp_dir)
}

/// Seed one NOT_STARTED record for a station
pub(crate) async fn seed_product(downloader: &StationDownloader, station: &str, name: &str) {
    downloader
        .status_store(station)
        .unwrap()
        .create(&crate::db::NewProduct {
            product_id: format!("id-{}", name),
            name: name.to_string(),
            available_at: 1_700_000_000,
        })
        .await
        .unwrap();
}

/// Poll a product until it reaches the wanted status (gives up after 5s)
pub(crate) async fn wait_for_status(
    downloader: &StationDownloader,
    station: &str,
    name: &str,
    wanted: crate::types::DownloadStatus,
) -> crate::types::ProductInfo {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let info = downloader.product_status(station, name).await.unwrap();
        if info.status == wanted {
            return info;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "product '{}' never reached {:?}, currently {:?} ({:?})",
            name,
            wanted,
            info.status,
            info.status_fail_message
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
