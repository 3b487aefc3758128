//! Common test utilities for analysis-service integration tests.

#![allow(dead_code)]

use analysis_service::config::{AnalysisConfig, GeminiSettings, LoggingSettings, ServerSettings};
use analysis_service::services::providers::VisionProvider;
use analysis_service::startup::Application;
use reqwest::multipart;
use secrecy::Secret;
use service_core::config::Config;
use std::sync::Arc;
use std::time::Duration;

/// Smallest byte sequence that looks like a JPEG header.
pub const FAKE_JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "gemini-test";

/// Configuration bound to a random local port, with no dependency on process env.
pub fn test_config(api_base: &str, api_key: Option<&str>) -> AnalysisConfig {
    AnalysisConfig {
        common: Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        gemini: GeminiSettings {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            model: TEST_MODEL.to_string(),
            api_base: api_base.to_string(),
            timeout_secs: 5,
        },
        server: ServerSettings {
            max_upload_bytes: 64 * 1024,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        logging: LoggingSettings::default(),
    }
}

async fn spawn(app: Application) -> String {
    let port = app.port();
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{}", port)
}

/// Spawn the application around `provider` and return its base URL.
pub async fn spawn_app_with_provider(
    config: AnalysisConfig,
    provider: Arc<dyn VisionProvider>,
) -> String {
    let app = Application::build_with_provider(config, provider)
        .await
        .expect("Failed to build application");
    spawn(app).await
}

/// Spawn the application with the real Gemini provider and return its base URL.
pub async fn spawn_app(config: AnalysisConfig) -> String {
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    spawn(app).await
}

/// Multipart form with `bytes` in the `image` field.
pub fn image_form(bytes: &[u8]) -> multipart::Form {
    multipart::Form::new().part(
        "image",
        multipart::Part::bytes(bytes.to_vec())
            .file_name("inventory.jpg")
            .mime_str("image/jpeg")
            .expect("valid mime type"),
    )
}

/// A Gemini `generateContent` envelope whose first part is `text`.
pub fn gemini_envelope(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 258, "candidatesTokenCount": 120}
    })
}

pub fn sample_analysis() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {"name": "Rice sacks", "estimated_count": 12},
            {"name": "Cooking oil bottles", "estimated_count": 24}
        ],
        "quality_assessment": {"rating": "Good", "notes": "Clean, well stacked shelves"},
        "optimizations": ["Label shelf sections", "Move fast sellers to eye level"],
        "safety_check": {"bias_detected": false, "privacy_concern": false}
    })
}
