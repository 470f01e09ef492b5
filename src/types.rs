//! Core types for station-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Download lifecycle status of a product record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Record exists but no retrieval has started (or it was reset)
    NotStarted,
    /// A retrieval worker is currently driving this record
    InProgress,
    /// Last retrieval attempt failed
    Failed,
    /// Product was fully retrieved (and uploaded, when requested)
    Done,
}

impl DownloadStatus {
    /// Convert integer status code to DownloadStatus
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => DownloadStatus::NotStarted,
            1 => DownloadStatus::InProgress,
            2 => DownloadStatus::Failed,
            3 => DownloadStatus::Done,
            _ => DownloadStatus::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert DownloadStatus to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            DownloadStatus::NotStarted => 0,
            DownloadStatus::InProgress => 1,
            DownloadStatus::Failed => 2,
            DownloadStatus::Done => 3,
        }
    }

    /// Whether this status is terminal (Done or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Done | DownloadStatus::Failed)
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DownloadStatus::NotStarted => "not_started",
            DownloadStatus::InProgress => "in_progress",
            DownloadStatus::Failed => "failed",
            DownloadStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Product family a ground station belongs to
///
/// Each family persists its records in its own status table so that the
/// ADGS and CADIP catalogs never share a namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StationFamily {
    /// Auxiliary Data Gathering Service products
    Adgs,
    /// CADU Interface Point session chunks
    Cadip,
}

impl StationFamily {
    /// Status table backing this family
    pub fn table(&self) -> &'static str {
        match self {
            StationFamily::Adgs => "adgs_download_status",
            StationFamily::Cadip => "cadip_download_status",
        }
    }

    /// All known families
    pub fn all() -> [StationFamily; 2] {
        [StationFamily::Adgs, StationFamily::Cadip]
    }
}

impl std::fmt::Display for StationFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationFamily::Adgs => write!(f, "adgs"),
            StationFamily::Cadip => write!(f, "cadip"),
        }
    }
}

/// Inbound request to retrieve one product
///
/// Not persisted; it only carries the HTTP query into the control layer.
#[derive(Clone, Debug, Default)]
pub struct DownloadRequest {
    /// Station to retrieve from
    pub station: String,

    /// Product name (the primary lookup key)
    pub product_name: String,

    /// Keep the artifact in this directory instead of a scoped temp dir
    pub local_directory: Option<PathBuf>,

    /// Upload the artifact under this object-storage prefix
    pub obs_path: Option<String>,
}

/// Half-open publication-time window used for catalog searches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeRange {
    /// Window start (inclusive)
    pub start: DateTime<Utc>,

    /// Window stop (exclusive)
    pub stop: DateTime<Utc>,
}

/// API-facing projection of a product status row
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductInfo {
    /// External product identifier assigned by the station
    pub product_id: String,

    /// Product name (unique within the family)
    pub name: String,

    /// When the station reported the product available
    pub available_at: DateTime<Utc>,

    /// When the last retrieval entered IN_PROGRESS (None if never started)
    pub download_start: Option<DateTime<Utc>>,

    /// When the last retrieval reached a terminal state
    pub download_stop: Option<DateTime<Utc>>,

    /// Current lifecycle status
    pub status: DownloadStatus,

    /// Failure detail, set only while status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_fail_message: Option<String>,
}

/// Event emitted during the retrieval lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A catalog search ingested a new product record
    Ingested {
        /// Station the product was found on
        station: String,
        /// Product name
        name: String,
    },

    /// A retrieval worker entered IN_PROGRESS for this product
    Started {
        /// Product name
        name: String,
    },

    /// Retrieval reached DONE
    Complete {
        /// Product name
        name: String,
    },

    /// Retrieval reached FAILED
    Failed {
        /// Product name
        name: String,
        /// Failure detail recorded on the row
        error: String,
    },

    /// The launch barrier timed out waiting for a worker's start signal
    LaunchTimedOut {
        /// Product name
        name: String,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
