//! Health endpoint tests. No upstream is contacted.

mod common;

use analysis_service::services::providers::mock::MockVisionProvider;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn health_check_returns_healthy() {
    let provider = Arc::new(MockVisionProvider::unconfigured());
    let base = common::spawn_app_with_provider(common::test_config("http://unused", None), provider).await;
    let client = Client::new();

    for path in ["/health", "/api/health"] {
        let response = client
            .get(format!("{}{}", base, path))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success(), "{} failed", path);

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "analysis-service");
    }
}

#[tokio::test]
async fn responses_carry_request_id() {
    let provider = Arc::new(MockVisionProvider::unconfigured());
    let base = common::spawn_app_with_provider(common::test_config("http://unused", None), provider).await;

    let response = Client::new()
        .get(format!("{}/health", base))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let provider = Arc::new(MockVisionProvider::unconfigured());
    let base = common::spawn_app_with_provider(common::test_config("http://unused", None), provider).await;

    let response = Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/analyze", base))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}
