//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::routes;

/// OpenAPI documentation for the station-dl REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "station-dl REST API",
        description = "Retrieval orchestration for Earth-observation ground-station products",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        routes::trigger_download,
        routes::product_status,
        routes::list_products,
        routes::search_products,
        routes::health_check,
        routes::openapi_spec,
        routes::event_stream,
        routes::shutdown,
    ),
    components(schemas(
        crate::types::ProductInfo,
        crate::types::DownloadStatus,
        crate::types::StationFamily,
        crate::types::TimeRange,
        crate::types::Event,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::config::Config,
        crate::config::StationConfig,
        crate::config::DownloadConfig,
        crate::config::ObsConfig,
        crate::config::TransferRetryConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,
    )),
    tags(
        (name = "products", description = "Product retrieval and status"),
        (name = "system", description = "Health, events, and lifecycle")
    )
)]
pub struct ApiDoc;
