//! Configuration types for station-dl

use crate::types::StationFamily;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Ground-station catalog configuration
///
/// One entry per reachable station. The `family` selects which status table
/// records for this station live in; several stations may share a family
/// (e.g. multiple CADIP stations), but a station name must be unique.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StationConfig {
    /// Station name used in API paths and provider resolution
    pub name: String,

    /// Product family (selects the backing status table)
    pub family: StationFamily,

    /// Base URL of the station's catalog endpoint
    pub base_url: String,

    /// Per-request timeout against the catalog (default: 30 seconds)
    #[serde(default = "default_catalog_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

/// Download behavior configuration (working directory, launch deadline)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Root for scoped per-retrieval working directories (default: "./work")
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// How long a request handler waits for a spawned retrieval task to
    /// signal that it has begun executing (default: 3 seconds)
    #[serde(default = "default_start_timeout", with = "duration_serde")]
    pub start_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            start_timeout: default_start_timeout(),
        }
    }
}

/// Fixed-interval retry policy for bulk object-storage transfers
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferRetryConfig {
    /// Attempts per file before recording it as failed (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts (default: 2 seconds)
    #[serde(default = "default_retry_wait", with = "duration_serde")]
    pub retry_wait: Duration,
}

impl Default for TransferRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_wait: default_retry_wait(),
        }
    }
}

/// Object-storage configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ObsConfig {
    /// Bucket uploads land in
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Custom endpoint URL for S3-compatible stores (None = AWS default)
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Region (default: "eu-west-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Retry policy for bulk transfers
    #[serde(default)]
    pub transfer: TransferRetryConfig,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            endpoint_url: None,
            region: default_region(),
            transfer: TransferRetryConfig::default(),
        }
    }
}

/// Data storage and state management
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Path to the SQLite status database (default: "./station-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address (default: 127.0.0.1:8343)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS middleware (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" for any, default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for StationDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — working directory, launch deadline
/// - [`obs`](ObsConfig) — object storage and bulk transfer retries
/// - [`persistence`](PersistenceConfig) — status database location
/// - [`api`](ApiConfig) — embedded REST server
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Ground-station catalogs (one per reachable station)
    #[serde(default)]
    pub stations: Vec<StationConfig>,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Object-storage settings
    #[serde(default)]
    pub obs: ObsConfig,

    /// Data storage and state management
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API server settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Look up a configured station by name
    pub fn station(&self, name: &str) -> Option<&StationConfig> {
        self.stations.iter().find(|s| s.name == name)
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./work")
}

fn default_start_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_catalog_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_wait() -> Duration {
    Duration::from_secs(2)
}

fn default_bucket() -> String {
    "station-products".to_string()
}

fn default_region() -> String {
    "eu-west-1".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./station-dl.db")
}

fn default_bind_address() -> SocketAddr {
    // Safe: literal address
    #[allow(clippy::expect_used)]
    "127.0.0.1:8343".parse().expect("valid default address")
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

/// Serialize/deserialize `Duration` as integer seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
