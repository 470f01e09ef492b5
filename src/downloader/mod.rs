//! Core downloader implementation split into focused submodules.
//!
//! The `StationDownloader` struct and its methods are organized by domain:
//! - [`launch`] - Launch barrier between handlers and retrieval tasks
//! - [`retrieval`] - Detached retrieval worker execution
//! - [`control`] - Trigger, status, listing, catalog search

mod control;
mod launch;
mod retrieval;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use launch::LaunchOutcome;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::provider::ProviderRegistry;
use crate::status::StatusStore;
use crate::storage::{ObjectStore, S3ObjectStore};
use crate::types::{Event, StationFamily};
use crate::{Error, storage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct StationDownloader {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query status rows directly
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Station providers, resolved by retrieval tasks at execution time
    pub(crate) providers: Arc<ProviderRegistry>,
    /// Object storage used for obs uploads and bulk transfers
    pub(crate) object_store: Arc<dyn ObjectStore>,
    /// One status store per product family (each with its own lock registry)
    pub(crate) stores: HashMap<StationFamily, StatusStore>,
    /// Process-wide shutdown signal; bulk-transfer retry waits race it
    pub(crate) shutdown_token: CancellationToken,
}

impl StationDownloader {
    /// Create a new StationDownloader instance
    ///
    /// This initializes all core components:
    /// - Opens/creates the SQLite status database and runs migrations
    /// - Builds an HTTP catalog provider per configured station
    /// - Sets up the S3 object store (client built lazily on first use)
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config) -> Result<Self> {
        let providers = ProviderRegistry::from_config(&config)?;
        let object_store = Arc::new(S3ObjectStore::new(config.obs.clone()));
        Self::with_collaborators(config, providers, object_store).await
    }

    /// Create an instance with externally supplied collaborators
    ///
    /// Embedders (and tests) can plug in their own [`crate::provider::Provider`]s
    /// and [`ObjectStore`] instead of the HTTP catalog clients and S3 store
    /// built from configuration.
    pub async fn with_collaborators(
        config: Config,
        providers: ProviderRegistry,
        object_store: Arc<dyn ObjectStore>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(&config.download.work_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create work directory '{}': {}",
                        config.download.work_dir.display(),
                        e
                    ),
                ))
            })?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        // Buffer size of 1000 events; subscribers that lag further get a
        // Lagged error rather than blocking producers.
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let stores = StationFamily::all()
            .into_iter()
            .map(|family| (family, StatusStore::new(db.clone(), family)))
            .collect();

        Ok(Self {
            db,
            event_tx,
            config: Arc::new(config),
            providers: Arc::new(providers),
            object_store,
            stores,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Subscribe to lifecycle events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The shutdown token raced by bulk-transfer retry waits
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Status store for the family the given station belongs to
    ///
    /// Fails with [`Error::UnknownStation`] when no station of that name is
    /// configured (the record table cannot even be chosen then).
    pub fn status_store(&self, station: &str) -> Result<&StatusStore> {
        let station_config = self
            .config
            .station(station)
            .ok_or_else(|| Error::UnknownStation(station.to_string()))?;
        self.stores
            .get(&station_config.family)
            .ok_or_else(|| Error::UnknownStation(station.to_string()))
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// retrieval never depends on anyone listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Bulk-upload local files under an object-storage prefix
    ///
    /// Applies the configured fixed-interval retry policy per file and
    /// returns the files that could not be uploaded. Shutdown aborts the
    /// run (including mid-wait).
    pub async fn upload_batch(
        &self,
        files: &[PathBuf],
        key_prefix: &str,
    ) -> Result<Vec<PathBuf>> {
        storage::upload_files(
            self.object_store.as_ref(),
            files,
            key_prefix,
            &self.config.obs.transfer,
            &self.shutdown_token,
        )
        .await
    }

    /// Bulk-download object keys into a local directory
    ///
    /// Same retry and shutdown semantics as [`Self::upload_batch`]; returns
    /// the keys that could not be downloaded.
    pub async fn download_batch(
        &self,
        keys: &[String],
        destination: &std::path::Path,
    ) -> Result<Vec<String>> {
        storage::download_files(
            self.object_store.as_ref(),
            keys,
            destination,
            &self.config.obs.transfer,
            &self.shutdown_token,
        )
        .await
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with retrieval tasks and listens on the
    /// configured bind address.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }

    /// Gracefully shut down the downloader
    ///
    /// Cancels the shutdown token so bulk-transfer retry waits abort
    /// immediately, and emits a shutdown event. In-flight retrieval tasks
    /// are not cancelled — they are fire-and-forget by design and their
    /// terminal status lands in the store whether or not anyone is left to
    /// observe it. The database pool closes when the last handle drops.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.shutdown_token.cancel();
        let _ = self.event_tx.send(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
