//! Per-record locking and persistence discipline for product status rows
//!
//! A [`StatusStore`] wraps one family's status table and serializes all
//! transitions on the same logical record through a process-wide lock
//! registry: two independently fetched handles to "the same" row share the
//! mutex keyed by the record's name. Locks are held only across a single
//! transition's write-and-refetch, never across I/O.
//!
//! Transitions carry the generation the caller observed at launch time;
//! writes whose generation no longer matches the row are dropped (the
//! record was reset for a newer request) and reported as `None`.

use crate::db::{Database, NewProduct, ProductRow};
use crate::error::DatabaseError;
use crate::types::StationFamily;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Handle to one family's status table with per-record mutual exclusion
#[derive(Clone)]
pub struct StatusStore {
    db: Arc<Database>,
    family: StationFamily,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl StatusStore {
    /// Create a store for one product family
    pub fn new(db: Arc<Database>, family: StationFamily) -> Self {
        Self {
            db,
            family,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The product family this store manages
    pub fn family(&self) -> StationFamily {
        self.family
    }

    /// Lock for one logical record, shared by every handle to that record
    fn record_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        // The registry mutex is held only for the map access, never across
        // an await point.
        #[allow(clippy::expect_used)]
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Fetch a record by name
    pub async fn get(&self, name: &str) -> Result<ProductRow> {
        self.db
            .get_product_by_name(self.family, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product '{}'", name)))
    }

    /// Create a new NOT_STARTED record
    ///
    /// Fails with [`Error::Conflict`] when the name or product_id already
    /// exists; it never silently overwrites.
    pub async fn create(&self, product: &NewProduct) -> Result<ProductRow> {
        match self.db.insert_product(self.family, product).await {
            Ok(_) => self.get(&product.name).await,
            Err(Error::Database(DatabaseError::ConstraintViolation(msg))) => {
                Err(Error::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// List all records for this family
    pub async fn list(&self) -> Result<Vec<ProductRow>> {
        self.db.list_products(self.family).await
    }

    /// Transition a record to IN_PROGRESS
    ///
    /// Returns the refreshed row, or `None` when the write was stale (the
    /// record was reset for a newer request since `generation` was read).
    pub async fn mark_in_progress(
        &self,
        name: &str,
        generation: i64,
    ) -> Result<Option<ProductRow>> {
        let lock = self.record_lock(name);
        let _guard = lock.lock().await;

        if !self.db.begin_download(self.family, name, generation).await? {
            tracing::debug!(name, generation, "Stale in-progress transition dropped");
            return Ok(None);
        }
        Ok(Some(self.get(name).await?))
    }

    /// Transition a record to DONE
    ///
    /// Returns the refreshed row, or `None` for a stale write.
    pub async fn mark_done(&self, name: &str, generation: i64) -> Result<Option<ProductRow>> {
        let lock = self.record_lock(name);
        let _guard = lock.lock().await;

        if !self.db.finish_download(self.family, name, generation).await? {
            tracing::debug!(name, generation, "Stale done transition dropped");
            return Ok(None);
        }
        Ok(Some(self.get(name).await?))
    }

    /// Transition a record to FAILED with a failure detail
    ///
    /// With `generation = Some(g)` the write is guarded like every other
    /// transition. With `None` it applies unconditionally; the
    /// launch-timeout path uses this form.
    pub async fn mark_failed(
        &self,
        name: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Result<Option<ProductRow>> {
        let lock = self.record_lock(name);
        let _guard = lock.lock().await;

        if !self
            .db
            .fail_download(self.family, name, message, generation)
            .await?
        {
            tracing::debug!(name, ?generation, "Stale failed transition dropped");
            return Ok(None);
        }
        Ok(Some(self.get(name).await?))
    }

    /// Reset a record to NOT_STARTED for a fresh attempt
    ///
    /// Clears timestamps and the failure message and bumps the generation,
    /// making any still-running worker for the previous attempt stale.
    /// Returns the refreshed row.
    pub async fn reset(&self, name: &str) -> Result<ProductRow> {
        let lock = self.record_lock(name);
        let _guard = lock.lock().await;

        if !self.db.reset_download(self.family, name).await? {
            return Err(Error::NotFound(format!("product '{}'", name)));
        }
        self.get(name).await
    }
}
