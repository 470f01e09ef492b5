//! Status row CRUD and the atomic transition statements.
//!
//! Every transition is a single UPDATE so concurrent writers can never
//! observe a partially applied transition. The guarded statements filter on
//! `generation` and report whether they applied, which is how stale writes
//! from a superseded retrieval worker are detected and dropped.

use crate::error::DatabaseError;
use crate::types::{DownloadStatus, StationFamily};
use crate::{Error, Result};

use super::{Database, NewProduct, ProductRow};

const ROW_COLUMNS: &str = "id, product_id, name, available_at, download_start, \
                           download_stop, status, fail_message, generation, created_at";

impl Database {
    /// Insert a new product record in NOT_STARTED state
    ///
    /// Fails with a constraint violation when the name or product_id is
    /// already present; existing rows are never silently overwritten.
    pub async fn insert_product(
        &self,
        family: StationFamily,
        product: &NewProduct,
    ) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (product_id, name, available_at, status, generation, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
            family.table()
        ))
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(product.available_at)
        .bind(DownloadStatus::NotStarted.to_i32())
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(r) => Ok(r.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err))
                if db_err.message().contains("UNIQUE constraint failed") =>
            {
                Err(Error::Database(DatabaseError::ConstraintViolation(format!(
                    "product '{}' ({}) already exists",
                    product.name, product.product_id
                ))))
            }
            Err(e) => Err(Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert product: {}",
                e
            )))),
        }
    }

    /// Get a product row by name
    pub async fn get_product_by_name(
        &self,
        family: StationFamily,
        name: &str,
    ) -> Result<Option<ProductRow>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} WHERE name = ?",
            ROW_COLUMNS,
            family.table()
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get product: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List all product rows for a family, oldest first
    pub async fn list_products(&self, family: StationFamily) -> Result<Vec<ProductRow>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} ORDER BY created_at ASC, id ASC",
            ROW_COLUMNS,
            family.table()
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list products: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List product rows with a specific status
    pub async fn list_products_by_status(
        &self,
        family: StationFamily,
        status: DownloadStatus,
    ) -> Result<Vec<ProductRow>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} WHERE status = ? ORDER BY created_at ASC, id ASC",
            ROW_COLUMNS,
            family.table()
        ))
        .bind(status.to_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list products by status: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Transition a row to IN_PROGRESS: sets download_start, clears
    /// download_stop and fail_message
    ///
    /// Guarded by generation; returns false when the row has been reset
    /// since the caller fetched it (stale write, dropped).
    pub async fn begin_download(
        &self,
        family: StationFamily,
        name: &str,
        generation: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET status = ?, download_start = ?, download_stop = NULL,
                          fail_message = NULL
            WHERE name = ? AND generation = ?
            "#,
            family.table()
        ))
        .bind(DownloadStatus::InProgress.to_i32())
        .bind(now)
        .bind(name)
        .bind(generation)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark download in progress: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition a row to DONE: sets download_stop, clears fail_message
    ///
    /// Guarded by generation; returns false for stale writes.
    pub async fn finish_download(
        &self,
        family: StationFamily,
        name: &str,
        generation: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET status = ?, download_stop = ?, fail_message = NULL
            WHERE name = ? AND generation = ?
            "#,
            family.table()
        ))
        .bind(DownloadStatus::Done.to_i32())
        .bind(now)
        .bind(name)
        .bind(generation)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark download done: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition a row to FAILED: sets download_stop and fail_message
    ///
    /// With `generation = Some(g)` the write is guarded like the other
    /// transitions. With `None` it applies unconditionally — the
    /// launch-timeout path uses this so its verdict lands regardless of the
    /// row's generation.
    pub async fn fail_download(
        &self,
        family: StationFamily,
        name: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let table = family.table();

        let result = match generation {
            Some(generation) => sqlx::query(&format!(
                r#"
                UPDATE {table} SET status = ?, download_stop = ?, fail_message = ?
                WHERE name = ? AND generation = ?
                "#
            ))
            .bind(DownloadStatus::Failed.to_i32())
            .bind(now)
            .bind(message)
            .bind(name)
            .bind(generation)
            .execute(&self.pool)
            .await,
            None => sqlx::query(&format!(
                r#"
                UPDATE {table} SET status = ?, download_stop = ?, fail_message = ?
                WHERE name = ?
                "#
            ))
            .bind(DownloadStatus::Failed.to_i32())
            .bind(now)
            .bind(message)
            .bind(name)
            .execute(&self.pool)
            .await,
        };

        let result = result.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark download failed: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Reset a row to NOT_STARTED for a fresh attempt: clears timestamps and
    /// fail_message and bumps the generation so in-flight workers from the
    /// previous attempt become stale
    pub async fn reset_download(&self, family: StationFamily, name: &str) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET status = ?, download_start = NULL, download_stop = NULL,
                          fail_message = NULL, generation = generation + 1
            WHERE name = ?
            "#,
            family.table()
        ))
        .bind(DownloadStatus::NotStarted.to_i32())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to reset download: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }
}
