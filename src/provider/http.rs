//! HTTP catalog provider
//!
//! Speaks the OData-flavoured catalog dialect the ADGS and CADIP stations
//! expose: `GET /Products?$filter=...` for searches and
//! `GET /Products(<id>)/$value` for payloads.

use super::{Provider, ProviderError, RemoteProduct};
use crate::config::StationConfig;
use crate::types::TimeRange;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Catalog client for one station
#[derive(Debug)]
pub struct HttpProvider {
    base_url: Url,
    client: reqwest::Client,
}

/// OData search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "value")]
    value: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "PublicationDate")]
    publication_date: DateTime<Utc>,
}

impl HttpProvider {
    /// Create a provider from a station's configuration
    pub fn new(station: &StationConfig) -> Result<Self> {
        let base_url = Url::parse(&station.base_url).map_err(|e| Error::Config {
            message: format!(
                "invalid base_url '{}' for station '{}': {}",
                station.base_url, station.name, e
            ),
            key: Some("stations".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .timeout(station.timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self { base_url, client })
    }

    fn products_url(&self) -> std::result::Result<Url, ProviderError> {
        self.base_url
            .join("Products")
            .map_err(|e| ProviderError::SearchFailed(format!("invalid catalog URL: {}", e)))
    }

    fn payload_url(&self, product_id: &str) -> std::result::Result<Url, ProviderError> {
        self.base_url
            .join(&format!("Products({})/$value", product_id))
            .map_err(|e| ProviderError::DownloadFailed(format!("invalid payload URL: {}", e)))
    }
}

/// Pick the payload filename from a Content-Disposition header, if present
fn attachment_filename(response: &reqwest::Response) -> Option<String> {
    let header = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    let (_, filename) = header.split_once("filename=")?;
    let filename = filename.trim_matches(|c| c == '"' || c == ' ');
    if filename.is_empty() {
        None
    } else {
        Some(filename.to_string())
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn search(
        &self,
        range: &TimeRange,
    ) -> std::result::Result<Vec<RemoteProduct>, ProviderError> {
        let filter = format!(
            "PublicationDate gt {} and PublicationDate lt {}",
            range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            range.stop.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        let url = self.products_url()?;
        tracing::debug!(%url, %filter, "Searching station catalog");

        let response = self
            .client
            .get(url)
            .query(&[("$filter", filter.as_str()), ("$top", "1000")])
            .send()
            .await
            .map_err(|e| ProviderError::SearchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProviderError::SearchFailed(e.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::SearchFailed(format!("invalid catalog response: {}", e)))?;

        Ok(body
            .value
            .into_iter()
            .map(|entry| RemoteProduct {
                id: entry.id,
                name: entry.name,
                available_at: entry.publication_date,
            })
            .collect())
    }

    async fn download(
        &self,
        product_id: &str,
        destination: &Path,
    ) -> std::result::Result<(), ProviderError> {
        let url = self.payload_url(product_id)?;
        tracing::debug!(%url, product_id, "Retrieving product payload");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;

        let filename =
            attachment_filename(&response).unwrap_or_else(|| product_id.to_string());
        let target = destination.join(filename);

        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(|e| ProviderError::DownloadFailed(format!("create {:?}: {}", target, e)))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| ProviderError::DownloadFailed(format!("write {:?}: {}", target, e)))?;
        }

        file.flush()
            .await
            .map_err(|e| ProviderError::DownloadFailed(format!("flush {:?}: {}", target, e)))?;

        tracing::debug!(product_id, target = %target.display(), "Payload written");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StationFamily;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn station(base_url: &str) -> StationConfig {
        StationConfig {
            name: "ins".to_string(),
            family: StationFamily::Cadip,
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn window() -> TimeRange {
        TimeRange {
            start: "2024-01-01T00:00:00Z".parse().unwrap(),
            stop: "2024-01-02T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpProvider::new(&station("not a url")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn search_parses_odata_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    {
                        "Id": "2b17b57d-fff4-4645-b539-91f305c27c69",
                        "Name": "DCS_01_S1A_20240101t000205_ch1_DSDB_00001.raw",
                        "PublicationDate": "2024-01-01T00:02:05.000Z"
                    },
                    {
                        "Id": "9f3c2e11-aaaa-4645-b539-91f305c27c70",
                        "Name": "DCS_01_S1A_20240101t000210_ch1_DSDB_00002.raw",
                        "PublicationDate": "2024-01-01T00:02:10.000Z"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&station(&format!("{}/", server.uri()))).unwrap();
        let products = provider.search(&window()).await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "2b17b57d-fff4-4645-b539-91f305c27c69");
        assert_eq!(
            products[0].name,
            "DCS_01_S1A_20240101t000205_ch1_DSDB_00001.raw"
        );
    }

    #[tokio::test]
    async fn search_maps_http_errors_to_search_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&station(&format!("{}/", server.uri()))).unwrap();
        let err = provider.search(&window()).await.unwrap_err();
        assert!(matches!(err, ProviderError::SearchFailed(_)));
    }

    #[tokio::test]
    async fn download_writes_payload_to_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Products(abc-123)/$value"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"chunk.raw\"")
                    .set_body_bytes(b"payload-bytes".to_vec()),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&station(&format!("{}/", server.uri()))).unwrap();
        let dir = tempfile::tempdir().unwrap();

        provider.download("abc-123", dir.path()).await.unwrap();

        let written = std::fs::read(dir.path().join("chunk.raw")).unwrap();
        assert_eq!(written, b"payload-bytes");
    }

    #[tokio::test]
    async fn download_falls_back_to_product_id_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Products(abc-123)/$value"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&station(&format!("{}/", server.uri()))).unwrap();
        let dir = tempfile::tempdir().unwrap();

        provider.download("abc-123", dir.path()).await.unwrap();
        assert!(dir.path().join("abc-123").exists());
    }

    #[tokio::test]
    async fn download_maps_missing_product_to_download_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Products(missing)/$value"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&station(&format!("{}/", server.uri()))).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = provider.download("missing", dir.path()).await.unwrap_err();
        assert!(matches!(err, ProviderError::DownloadFailed(_)));
    }
}
