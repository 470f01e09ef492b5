//! Product retrieval handlers.

use super::{NameQuery, SearchQuery, TriggerQuery};
use crate::api::AppState;
use crate::downloader::LaunchOutcome;
use crate::types::{DownloadRequest, TimeRange};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// GET /stations/:station/products - Trigger a product retrieval
///
/// Returns as soon as the spawned retrieval task signals that it is
/// running; the eventual DONE/FAILED verdict is only observable through
/// the status endpoint.
#[utoipa::path(
    get,
    path = "/stations/{station}/products",
    tag = "products",
    params(
        ("station" = String, Path, description = "Station name"),
        TriggerQuery
    ),
    responses(
        (status = 200, description = "Retrieval task started"),
        (status = 408, description = "Task did not signal start before the deadline; record forced to FAILED"),
        (status = 503, description = "Status-store lookup failed (unknown station or product)")
    )
)]
pub async fn trigger_download(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Query(query): Query<TriggerQuery>,
) -> Response {
    let request = DownloadRequest {
        station,
        product_name: query.name,
        local_directory: query.local,
        obs_path: query.obs,
    };
    let name = request.product_name.clone();

    match state.downloader.request_download(request).await {
        Ok(LaunchOutcome::Started) => {
            (StatusCode::OK, Json(json!({"started": "true"}))).into_response()
        }
        Ok(LaunchOutcome::TimedOut) => (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({"started": "false"})),
        )
            .into_response(),
        Err(e) => {
            // The task never launched; whatever went wrong, the caller only
            // needs to know nothing started.
            tracing::warn!(name, error = %e, "Retrieval trigger rejected");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"started": "false", "error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// GET /stations/:station/products/status - Current status of one product
#[utoipa::path(
    get,
    path = "/stations/{station}/products/status",
    tag = "products",
    params(
        ("station" = String, Path, description = "Station name"),
        NameQuery
    ),
    responses(
        (status = 200, description = "Product status record", body = crate::types::ProductInfo),
        (status = 400, description = "Unknown station"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn product_status(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Query(query): Query<NameQuery>,
) -> Response {
    match state.downloader.product_status(&station, &query.name).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /stations/:station/products/list - All known products for a station
#[utoipa::path(
    get,
    path = "/stations/{station}/products/list",
    tag = "products",
    params(
        ("station" = String, Path, description = "Station name")
    ),
    responses(
        (status = 200, description = "All product records for the station's family", body = Vec<crate::types::ProductInfo>),
        (status = 400, description = "Unknown station")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Path(station): Path<String>,
) -> Response {
    match state.downloader.list_products(&station).await {
        Ok(infos) => (StatusCode::OK, Json(infos)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /stations/:station/search - Search the catalog and ingest products
///
/// Products published inside the window that were never seen before get a
/// NOT_STARTED record; known products are returned untouched.
#[utoipa::path(
    get,
    path = "/stations/{station}/search",
    tag = "products",
    params(
        ("station" = String, Path, description = "Station name"),
        SearchQuery
    ),
    responses(
        (status = 200, description = "Records for every product in the window", body = Vec<crate::types::ProductInfo>),
        (status = 400, description = "Unknown station"),
        (status = 502, description = "Catalog search failed")
    )
)]
pub async fn search_products(
    State(state): State<AppState>,
    Path(station): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let range = TimeRange {
        start: query.start,
        stop: query.stop,
    };

    match state.downloader.search_station(&station, range).await {
        Ok(infos) => (StatusCode::OK, Json(infos)).into_response(),
        Err(e) => e.into_response(),
    }
}
