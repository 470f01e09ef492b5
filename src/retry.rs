//! Fixed-interval retry for bulk object-storage transfers
//!
//! Unlike the per-product retrieval worker (which never retries — a new
//! request from the HTTP layer is the only retry mechanism there), bulk
//! transfers retry each item a bounded number of times with a fixed wait
//! between attempts. Every wait is raced against a shutdown
//! [`CancellationToken`] so a terminating process never sits out a retry
//! interval.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a retried operation ultimately did not succeed
#[derive(Debug)]
pub enum RetryError<E> {
    /// All attempts failed; carries the last error
    Exhausted(E),
    /// Shutdown was signalled during a retry wait
    Cancelled,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Exhausted(e) => write!(f, "retries exhausted: {}", e),
            RetryError::Cancelled => write!(f, "cancelled during retry wait"),
        }
    }
}

/// Execute an async operation with bounded fixed-interval retries
///
/// The operation is attempted up to `max_attempts` times. Between attempts
/// the fixed `retry_wait` elapses, unless `shutdown` fires first, in which
/// case the loop aborts immediately with [`RetryError::Cancelled`].
///
/// `max_attempts` of 0 is treated as 1: the operation always runs at least
/// once.
pub async fn retry_fixed<F, Fut, T, E>(
    max_attempts: u32,
    retry_wait: Duration,
    shutdown: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    wait_ms = retry_wait.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Shutdown signalled, aborting retry wait");
                        return Err(RetryError::Cancelled);
                    }
                    _ = tokio::time::sleep(retry_wait) => {}
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "Operation failed after all retry attempts exhausted"
                );
                return Err(RetryError::Exhausted(e));
            }
        }
    }
}
