use super::*;
use crate::downloader::test_helpers::{
    MemoryObjectStore, ScriptedProvider, create_test_downloader, seed_product,
};
use crate::provider::Provider;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use tower::ServiceExt;

mod products;

/// Router plus the handles tests need to steer the scenario
async fn create_test_router(
    providers: Vec<(&str, Arc<dyn Provider>)>,
) -> (
    Router,
    Arc<StationDownloader>,
    Arc<MemoryObjectStore>,
    tempfile::TempDir,
) {
    let (downloader, object_store, temp_dir) = create_test_downloader(providers).await;
    let downloader = Arc::new(downloader);
    let config = downloader.get_config();
    let router = create_router(downloader.clone(), config);
    (router, downloader, object_store, temp_dir)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_endpoint_reports_ok_and_version() {
    let (router, _downloader, _store, _temp) = create_test_router(vec![]).await;

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (_, downloader, _store, _temp) = create_test_router(vec![]).await;

    let mut config = (*downloader.get_config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let router = create_router(downloader.clone(), Arc::new(config));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn openapi_spec_documents_the_product_routes() {
    let (router, _downloader, _store, _temp) = create_test_router(vec![]).await;

    let (status, spec) = get_json(&router, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);

    let openapi_version = spec["openapi"].as_str().unwrap();
    assert!(openapi_version.starts_with("3."), "should be OpenAPI 3.x");
    assert_eq!(spec["info"]["title"], "station-dl REST API");

    let paths = spec["paths"].as_object().unwrap();
    for expected in [
        "/stations/{station}/products",
        "/stations/{station}/products/status",
        "/stations/{station}/products/list",
        "/stations/{station}/search",
        "/health",
        "/events",
    ] {
        assert!(paths.contains_key(expected), "missing path {expected}");
    }

    let schemas = spec["components"]["schemas"].as_object().unwrap();
    for expected in ["ProductInfo", "DownloadStatus", "StationFamily", "Event"] {
        assert!(schemas.contains_key(expected), "missing schema {expected}");
    }
}

#[tokio::test]
async fn swagger_ui_absent_when_disabled() {
    let (_, downloader, _store, _temp) = create_test_router(vec![]).await;

    let mut config = (*downloader.get_config()).clone();
    config.api.swagger_ui = false;
    let router = create_router(downloader.clone(), Arc::new(config));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
