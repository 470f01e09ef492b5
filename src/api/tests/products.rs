use super::*;
use crate::provider::RemoteProduct;
use std::time::Duration;

#[tokio::test]
async fn trigger_returns_started_true_and_status_reaches_done() {
    let provider = Arc::new(ScriptedProvider::default());
    let (router, downloader, _store, _temp) = create_test_router(vec![("ins", provider)]).await;
    seed_product(&downloader, "ins", "chunk-1").await;

    let (status, body) = get_json(&router, "/stations/ins/products?name=chunk-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], "true");

    // The HTTP layer never learns the verdict from the trigger response;
    // poll the status endpoint like a real client.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (status, body) = get_json(&router, "/stations/ins/products/status?name=chunk-1").await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "done" {
            assert!(body.get("status_fail_message").is_none());
            assert!(body["download_start"].is_string());
            assert!(body["download_stop"].is_string());
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "product never reached done: {body}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn trigger_with_failing_provider_still_returns_started_true() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_fail_download(Some("boom"));
    let (router, downloader, _store, _temp) = create_test_router(vec![("ins", provider)]).await;
    seed_product(&downloader, "ins", "chunk-1").await;

    let (status, body) = get_json(&router, "/stations/ins/products?name=chunk-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["started"], "true",
        "the task started; its failure is only visible in the status record"
    );

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (_, body) = get_json(&router, "/stations/ins/products/status?name=chunk-1").await;
        if body["status"] == "failed" {
            assert!(
                body["status_fail_message"].as_str().unwrap().contains("boom"),
                "fail message must carry the error: {body}"
            );
            break;
        }
        assert!(std::time::Instant::now() < deadline, "never failed: {body}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn trigger_for_unknown_product_is_503_started_false() {
    let provider = Arc::new(ScriptedProvider::default());
    let (router, _downloader, _store, _temp) = create_test_router(vec![("ins", provider)]).await;

    let (status, body) = get_json(&router, "/stations/ins/products?name=never-seen").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["started"], "false");
}

#[tokio::test]
async fn trigger_for_unknown_station_is_503_started_false() {
    let (router, _downloader, _store, _temp) = create_test_router(vec![]).await;

    let (status, body) = get_json(&router, "/stations/nowhere/products?name=chunk-1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["started"], "false");
}

#[tokio::test]
async fn status_of_unknown_product_is_404() {
    let (router, _downloader, _store, _temp) = create_test_router(vec![]).await;

    let (status, body) = get_json(&router, "/stations/ins/products/status?name=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn status_of_unknown_station_is_400() {
    let (router, _downloader, _store, _temp) = create_test_router(vec![]).await;

    let (status, body) = get_json(&router, "/stations/nowhere/products/status?name=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_station");
}

#[tokio::test]
async fn search_ingests_and_list_shows_the_records() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.set_products(vec![RemoteProduct {
        id: "id-a".to_string(),
        name: "A".to_string(),
        available_at: "2024-01-01T00:10:00Z".parse().unwrap(),
    }]);
    let (router, _downloader, _store, _temp) = create_test_router(vec![("ins", provider)]).await;

    let (status, body) = get_json(
        &router,
        "/stations/ins/search?start=2024-01-01T00:00:00Z&stop=2024-01-02T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "A");
    assert_eq!(body[0]["status"], "not_started");

    let (status, body) = get_json(&router, "/stations/ins/products/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
