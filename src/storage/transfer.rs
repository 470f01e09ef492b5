//! Bulk object-storage transfers with partial-failure semantics
//!
//! Each item is attempted with the fixed-interval retry policy from
//! [`crate::retry`]; items whose retries are exhausted land in the returned
//! failed-list and processing continues with the next item. A shutdown
//! signal aborts the current retry wait and the whole run.

use super::ObjectStore;
use crate::config::TransferRetryConfig;
use crate::retry::{RetryError, retry_fixed};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Object key for a file placed under a prefix
fn key_for(prefix: &str, file: &Path) -> String {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", prefix.trim_end_matches('/'), filename)
}

/// Upload a batch of local files under a key prefix
///
/// Returns the files that could not be uploaded after all retries; an empty
/// list means every file made it. Fails with [`Error::ShuttingDown`] when
/// the shutdown token fires mid-run.
pub async fn upload_files(
    store: &dyn ObjectStore,
    files: &[PathBuf],
    key_prefix: &str,
    policy: &TransferRetryConfig,
    shutdown: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    let mut failed = Vec::new();

    for file in files {
        let key = key_for(key_prefix, file);

        let outcome = retry_fixed(policy.max_attempts, policy.retry_wait, shutdown, || {
            store.store(file, &key)
        })
        .await;

        match outcome {
            Ok(()) => {}
            Err(RetryError::Exhausted(e)) => {
                tracing::warn!(
                    file = %file.display(),
                    key,
                    error = %e,
                    "Upload abandoned after retries, continuing with next file"
                );
                failed.push(file.clone());
            }
            Err(RetryError::Cancelled) => return Err(Error::ShuttingDown),
        }
    }

    if !failed.is_empty() {
        tracing::warn!(
            failed = failed.len(),
            total = files.len(),
            "Bulk upload finished with failures"
        );
    }

    Ok(failed)
}

/// Download a batch of object keys into a local directory
///
/// Each object lands at `destination/<last key segment>`. Returns the keys
/// that could not be downloaded after all retries.
pub async fn download_files(
    store: &dyn ObjectStore,
    keys: &[String],
    destination: &Path,
    policy: &TransferRetryConfig,
    shutdown: &CancellationToken,
) -> Result<Vec<String>> {
    let mut failed = Vec::new();

    for key in keys {
        let filename = key.rsplit('/').next().unwrap_or(key);
        let target = destination.join(filename);

        let outcome = retry_fixed(policy.max_attempts, policy.retry_wait, shutdown, || {
            store.fetch(key, &target)
        })
        .await;

        match outcome {
            Ok(()) => {}
            Err(RetryError::Exhausted(e)) => {
                tracing::warn!(
                    key,
                    error = %e,
                    "Download abandoned after retries, continuing with next key"
                );
                failed.push(key.clone());
            }
            Err(RetryError::Cancelled) => return Err(Error::ShuttingDown),
        }
    }

    Ok(failed)
}
