//! Download lifecycle control — trigger, status, listing, catalog search.

use super::StationDownloader;
use super::launch::{LaunchOutcome, launch_detached};
use super::retrieval::{RetrievalContext, run_retrieval_task};
use crate::db::NewProduct;
use crate::types::{DownloadRequest, Event, ProductInfo, TimeRange};
use crate::{Error, Result};

/// Fixed failure detail recorded when the launch barrier times out
pub(crate) const START_TIMEOUT_FAIL_MESSAGE: &str = "Download thread did not start!";

impl StationDownloader {
    /// Trigger a retrieval for one product
    ///
    /// Resets the product's record for a fresh attempt, spawns a detached
    /// retrieval task, and waits only for the task's start signal:
    /// - `Started` — the task is running; poll the status endpoint for its
    ///   eventual DONE/FAILED verdict.
    /// - `TimedOut` — the start signal did not arrive within
    ///   `download.start_timeout`; the record is forced to FAILED. The task
    ///   is not cancelled and may still overwrite that verdict if it was
    ///   merely late.
    ///
    /// Fails with [`Error::NotFound`] when the product was never ingested
    /// and [`Error::UnknownStation`] when the station is not configured.
    pub async fn request_download(&self, request: DownloadRequest) -> Result<LaunchOutcome> {
        let store = self.status_store(&request.station)?.clone();

        // Reset for a fresh attempt; bumps the generation so any worker
        // still running from a previous request goes stale.
        let row = store.reset(&request.product_name).await?;

        tracing::info!(
            name = %request.product_name,
            station = %request.station,
            generation = row.generation,
            "Launching retrieval task"
        );

        let ctx = RetrievalContext {
            station: request.station.clone(),
            name: request.product_name.clone(),
            product_id: row.product_id,
            generation: row.generation,
            local_directory: request.local_directory,
            obs_path: request.obs_path,
            store: store.clone(),
            providers: self.providers.clone(),
            object_store: self.object_store.clone(),
            event_tx: self.event_tx.clone(),
            work_root: self.config.download.work_dir.clone(),
        };

        let outcome = launch_detached(self.config.download.start_timeout, move |signal| {
            run_retrieval_task(ctx, signal)
        })
        .await;

        if outcome == LaunchOutcome::TimedOut {
            tracing::warn!(
                name = %request.product_name,
                timeout_ms = self.config.download.start_timeout.as_millis(),
                "Retrieval task did not signal start in time"
            );

            // Unguarded write: the verdict must land even though we cannot
            // know whether the worker is dead or merely late. A late worker
            // still owns the row's generation and may overwrite this.
            if let Err(e) = store
                .mark_failed(&request.product_name, START_TIMEOUT_FAIL_MESSAGE, None)
                .await
            {
                tracing::error!(
                    name = %request.product_name,
                    error = %e,
                    "Could not record start-timeout failure"
                );
            }
            self.emit_event(Event::LaunchTimedOut {
                name: request.product_name.clone(),
            });
        }

        Ok(outcome)
    }

    /// Current status of one product
    pub async fn product_status(&self, station: &str, name: &str) -> Result<ProductInfo> {
        let store = self.status_store(station)?;
        Ok(store.get(name).await?.to_info())
    }

    /// All known products for a station's family
    pub async fn list_products(&self, station: &str) -> Result<Vec<ProductInfo>> {
        let store = self.status_store(station)?;
        Ok(store.list().await?.iter().map(|row| row.to_info()).collect())
    }

    /// Search a station's catalog and ingest unseen products
    ///
    /// Every product the catalog reports inside the window gets a
    /// NOT_STARTED record; products already known are returned as-is (their
    /// state is never touched). Returns the records for the whole window.
    pub async fn search_station(
        &self,
        station: &str,
        range: TimeRange,
    ) -> Result<Vec<ProductInfo>> {
        let store = self.status_store(station)?.clone();
        let provider = self.providers.resolve(station)?;

        let found = provider.search(&range).await.map_err(Error::Provider)?;
        tracing::info!(station, products = found.len(), "Catalog search complete");

        let mut infos = Vec::with_capacity(found.len());
        for product in found {
            let new = NewProduct {
                product_id: product.id,
                name: product.name.clone(),
                available_at: product.available_at.timestamp(),
            };

            match store.create(&new).await {
                Ok(row) => {
                    self.emit_event(Event::Ingested {
                        station: station.to_string(),
                        name: product.name.clone(),
                    });
                    infos.push(row.to_info());
                }
                Err(Error::Conflict(_)) => {
                    // Already ingested by an earlier search
                    infos.push(store.get(&product.name).await?.to_info());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(infos)
    }
}
