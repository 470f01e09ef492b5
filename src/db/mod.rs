//! Database layer for station-dl
//!
//! Handles SQLite persistence for the per-family download status tables.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`products`] — Status row CRUD and the atomic transition statements

use crate::types::{DownloadStatus, ProductInfo};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod products;

/// New product record to be inserted into a family's status table
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// External product identifier assigned by the station
    pub product_id: String,
    /// Product name (the primary lookup key)
    pub name: String,
    /// Unix timestamp the station reported the product available
    pub available_at: i64,
}

/// Product status row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    /// Unique database ID
    pub id: i64,
    /// External product identifier assigned by the station
    pub product_id: String,
    /// Product name (unique within the family)
    pub name: String,
    /// Unix timestamp the station reported the product available
    pub available_at: i64,
    /// Unix timestamp the last retrieval entered IN_PROGRESS
    pub download_start: Option<i64>,
    /// Unix timestamp the last retrieval reached a terminal state
    pub download_stop: Option<i64>,
    /// Current status code (see [`DownloadStatus`])
    pub status: i32,
    /// Failure detail, set only while status is Failed
    pub fail_message: Option<String>,
    /// Reset counter; bumped on every NOT_STARTED reset so stale worker
    /// transitions can be detected and dropped
    pub generation: i64,
    /// Unix timestamp when the row was created
    pub created_at: i64,
}

impl ProductRow {
    /// Decoded lifecycle status
    pub fn download_status(&self) -> DownloadStatus {
        DownloadStatus::from_i32(self.status)
    }

    /// API-facing projection of this row
    pub fn to_info(&self) -> ProductInfo {
        use chrono::{DateTime, Utc};

        let to_datetime =
            |ts: i64| DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now);

        ProductInfo {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            available_at: to_datetime(self.available_at),
            download_start: self.download_start.map(to_datetime),
            download_stop: self.download_stop.map(to_datetime),
            status: self.download_status(),
            status_fail_message: self.fail_message.clone(),
        }
    }
}

/// Database handle for station-dl
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
