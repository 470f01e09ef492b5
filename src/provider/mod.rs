//! Station catalog providers
//!
//! A [`Provider`] knows how to search one ground station's catalog and pull
//! a product's payload to local disk. The retrieval worker resolves its
//! provider through the [`ProviderRegistry`] at execution time, so a
//! misconfigured station surfaces as a FAILED record rather than an HTTP
//! error — by the time resolution runs, the handler has already returned.

use crate::types::TimeRange;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error as ThisError;

mod http;

pub use http::HttpProvider;

/// Errors raised by station catalog providers
#[derive(Debug, ThisError)]
pub enum ProviderError {
    /// Catalog search request failed
    #[error("search failed: {0}")]
    SearchFailed(String),

    /// Product payload retrieval failed
    #[error("download failed: {0}")]
    DownloadFailed(String),
}

/// One product as reported by a station catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteProduct {
    /// External identifier assigned by the station
    pub id: String,
    /// Product name
    pub name: String,
    /// When the station published the product
    pub available_at: DateTime<Utc>,
}

/// Access to one ground station's catalog
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// List products published inside the given time window
    async fn search(
        &self,
        range: &TimeRange,
    ) -> std::result::Result<Vec<RemoteProduct>, ProviderError>;

    /// Retrieve one product's payload into `destination` (a directory)
    async fn download(
        &self,
        product_id: &str,
        destination: &Path,
    ) -> std::result::Result<(), ProviderError>;
}

/// Maps station names to their providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with an [`HttpProvider`] per configured station
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let mut registry = Self::new();
        for station in &config.stations {
            let provider = HttpProvider::new(station)?;
            registry.register(&station.name, Arc::new(provider));
        }
        Ok(registry)
    }

    /// Register a provider for a station name (replacing any previous one)
    pub fn register(&mut self, station: &str, provider: Arc<dyn Provider>) {
        self.providers.insert(station.to_string(), provider);
    }

    /// Resolve the provider for a station
    ///
    /// An unknown station is a configuration error, not a transient one.
    pub fn resolve(&self, station: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(station)
            .cloned()
            .ok_or_else(|| Error::UnknownStation(station.to_string()))
    }

    /// Names of all registered stations
    pub fn stations(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn search(
            &self,
            _range: &TimeRange,
        ) -> std::result::Result<Vec<RemoteProduct>, ProviderError> {
            Ok(vec![])
        }

        async fn download(
            &self,
            _product_id: &str,
            _destination: &Path,
        ) -> std::result::Result<(), ProviderError> {
            Ok(())
        }
    }

    #[test]
    fn resolve_unknown_station_is_a_config_error() {
        let registry = ProviderRegistry::new();
        let err = registry.resolve("nowhere").unwrap_err();
        assert!(matches!(err, Error::UnknownStation(_)));
        assert!(
            err.to_string().contains("invalid station 'nowhere'"),
            "detail must name the station: {err}"
        );
    }

    #[test]
    fn resolve_returns_registered_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register("ins", Arc::new(NullProvider));
        assert!(registry.resolve("ins").is_ok());
        assert_eq!(registry.stations(), vec!["ins"]);
    }
}
