//! Application state for the API server

use crate::{Config, StationDownloader};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone); provides access to the
/// downloader instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main StationDownloader instance
    pub downloader: Arc<StationDownloader>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<StationDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
