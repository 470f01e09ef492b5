//! Retrieval worker — the detached task that drives a product record
//! through its state machine
//!
//! One invocation covers one attempt: IN_PROGRESS on entry, then DONE or
//! FAILED. Nothing here retries; the only retry mechanism is a fresh
//! request from the HTTP layer, which resets the record and launches a new
//! worker. Every error is caught at the task boundary and converted into a
//! FAILED transition — there is no caller left to propagate to.

use super::launch::StartSignal;
use crate::provider::ProviderRegistry;
use crate::status::StatusStore;
use crate::storage::ObjectStore;
use crate::types::Event;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything a retrieval task needs, captured at launch time
pub(crate) struct RetrievalContext {
    /// Station to pull from
    pub(crate) station: String,
    /// Product name (lookup key)
    pub(crate) name: String,
    /// External product identifier handed to the provider
    pub(crate) product_id: String,
    /// Row generation observed at launch; all transitions carry it so a
    /// reset that happened after launch makes this worker's writes stale
    pub(crate) generation: i64,
    /// Caller-supplied directory to keep the payload in (not cleaned up)
    pub(crate) local_directory: Option<PathBuf>,
    /// Object-storage prefix to upload the payload under
    pub(crate) obs_path: Option<String>,
    /// Status store for the product's family
    pub(crate) store: StatusStore,
    /// Provider registry, resolved inside the task (step 3)
    pub(crate) providers: Arc<ProviderRegistry>,
    /// Object storage used when `obs_path` is set
    pub(crate) object_store: Arc<dyn ObjectStore>,
    /// Lifecycle event channel
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Root for scoped working directories
    pub(crate) work_root: PathBuf,
}

/// Working directory for one retrieval
///
/// Scoped directories are created fresh and removed on every exit path;
/// a caller-supplied external directory is used as-is and left alone.
enum Workdir {
    Scoped(PathBuf),
    External(PathBuf),
}

impl Workdir {
    async fn scoped(root: &Path, name: &str, generation: i64) -> Result<Self> {
        let dir = root.join(format!("retrieve_{}_{}", name, generation));
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create working directory '{}': {}", dir.display(), e),
            ))
        })?;
        Ok(Workdir::Scoped(dir))
    }

    async fn external(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create local directory '{}': {}", dir.display(), e),
            ))
        })?;
        Ok(Workdir::External(dir))
    }

    fn path(&self) -> &Path {
        match self {
            Workdir::Scoped(dir) | Workdir::External(dir) => dir,
        }
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if let Workdir::Scoped(dir) = self {
            // Best effort; a leftover directory is only wasted disk
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove working directory");
            }
        }
    }
}

/// Run one retrieval attempt to a terminal state
///
/// This is the outermost boundary of the worker: the start signal fires
/// before anything else, and any error from the attempt is logged and
/// recorded as a FAILED transition instead of propagating.
pub(crate) async fn run_retrieval_task(ctx: RetrievalContext, signal: StartSignal) {
    // The launcher is blocked on this; it must precede any slow I/O.
    signal.begun();

    match execute(&ctx).await {
        Ok(true) => {
            tracing::info!(name = %ctx.name, station = %ctx.station, "Retrieval complete");
            let _ = ctx.event_tx.send(Event::Complete {
                name: ctx.name.clone(),
            });
        }
        Ok(false) => {
            tracing::info!(
                name = %ctx.name,
                generation = ctx.generation,
                "Retrieval superseded by a newer request, exiting without a verdict"
            );
        }
        Err(e) => {
            let detail = format!("{:?}", e);
            tracing::error!(name = %ctx.name, station = %ctx.station, error = %e, "Retrieval failed");

            match ctx
                .store
                .mark_failed(&ctx.name, &detail, Some(ctx.generation))
                .await
            {
                Ok(Some(_)) => {
                    let _ = ctx.event_tx.send(Event::Failed {
                        name: ctx.name.clone(),
                        error: detail,
                    });
                }
                Ok(None) => {
                    tracing::debug!(name = %ctx.name, "Failure verdict stale, dropped");
                }
                Err(store_err) => {
                    tracing::error!(
                        name = %ctx.name,
                        error = %store_err,
                        "Could not record retrieval failure"
                    );
                }
            }
        }
    }
}

/// The retrieval attempt itself
///
/// Returns `Ok(true)` when the record reached DONE, `Ok(false)` when this
/// worker was superseded by a newer request.
async fn execute(ctx: &RetrievalContext) -> Result<bool> {
    if ctx
        .store
        .mark_in_progress(&ctx.name, ctx.generation)
        .await?
        .is_none()
    {
        return Ok(false);
    }
    let _ = ctx.event_tx.send(Event::Started {
        name: ctx.name.clone(),
    });

    // Unknown or misconfigured station: fail fast, nothing to retry
    let provider = ctx.providers.resolve(&ctx.station)?;

    let workdir = match &ctx.local_directory {
        Some(dir) => Workdir::external(dir.clone()).await?,
        None => Workdir::scoped(&ctx.work_root, &ctx.name, ctx.generation).await?,
    };

    provider
        .download(&ctx.product_id, workdir.path())
        .await
        .map_err(Error::Provider)?;

    if let Some(obs_path) = &ctx.obs_path {
        upload_artifacts(ctx, workdir.path(), obs_path).await?;
    }

    match ctx.store.mark_done(&ctx.name, ctx.generation).await? {
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

/// Upload every file the provider left in the working directory
///
/// Single attempt per file; an upload failure fails the whole retrieval.
async fn upload_artifacts(ctx: &RetrievalContext, workdir: &Path, obs_path: &str) -> Result<()> {
    let mut entries = tokio::fs::read_dir(workdir).await?;
    let mut uploaded = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let file = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();
        let key = format!("{}/{}", obs_path.trim_end_matches('/'), filename);

        ctx.object_store
            .store(&file, &key)
            .await
            .map_err(Error::Storage)?;
        uploaded += 1;
    }

    tracing::debug!(name = %ctx.name, obs_path, uploaded, "Artifacts uploaded");
    Ok(())
}
