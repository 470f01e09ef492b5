//! # station-dl
//!
//! Download orchestration library for Earth-observation ground-station
//! products (ADGS and CADIP families).
//!
//! ## Design Philosophy
//!
//! station-dl is designed to be:
//! - **Fire-and-forget** - A trigger request only waits for proof that the
//!   retrieval task has begun; the verdict is observed through the status store
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding,
//!   with an optional embedded REST API
//! - **Pluggable** - Station catalogs and object storage sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use station_dl::{Config, StationDownloader, StationFamily, config::StationConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         stations: vec![StationConfig {
//!             name: "ins".to_string(),
//!             family: StationFamily::Cadip,
//!             base_url: "https://cadip-ins.example.com/".to_string(),
//!             timeout: std::time::Duration::from_secs(30),
//!         }],
//!         ..Default::default()
//!     };
//!
//!     let downloader = Arc::new(StationDownloader::new(config).await?);
//!     downloader.spawn_api_server();
//!
//!     // Subscribe to lifecycle events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     station_dl::run_with_shutdown(&downloader).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Station catalog providers
pub mod provider;
/// Fixed-interval retry for bulk transfers
pub mod retry;
/// Per-record status store
pub mod status;
/// Object storage access and bulk transfers
pub mod storage;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use downloader::{LaunchOutcome, StationDownloader};
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, ProviderError, Result, StorageError,
    ToHttpStatus,
};
pub use provider::{HttpProvider, Provider, ProviderRegistry, RemoteProduct};
pub use status::StatusStore;
pub use storage::{ObjectStore, S3ObjectStore};
pub use types::{
    DownloadRequest, DownloadStatus, Event, ProductInfo, StationFamily, TimeRange,
};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(downloader: &StationDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal handlers may fail to register in restricted environments
    // (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
