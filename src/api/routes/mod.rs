//! Route handlers, organized by domain.

mod products;
mod system;

pub use products::*;
pub use system::*;

use serde::Deserialize;
use std::path::PathBuf;
use utoipa::IntoParams;

/// Query parameters for triggering a retrieval
#[derive(Debug, Deserialize, IntoParams)]
pub struct TriggerQuery {
    /// Product name to retrieve
    pub name: String,
    /// Keep the payload in this local directory instead of a temp dir
    pub local: Option<PathBuf>,
    /// Upload the payload under this object-storage prefix
    pub obs: Option<String>,
}

/// Query parameters identifying one product by name
#[derive(Debug, Deserialize, IntoParams)]
pub struct NameQuery {
    /// Product name
    pub name: String,
}

/// Query parameters for a catalog search window
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Window start (RFC 3339)
    pub start: chrono::DateTime<chrono::Utc>,
    /// Window stop (RFC 3339)
    pub stop: chrono::DateTime<chrono::Utc>,
}
