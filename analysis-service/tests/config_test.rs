//! `AnalysisConfig::load` against the process environment.

use analysis_service::config::AnalysisConfig;
use secrecy::ExposeSecret;
use serial_test::serial;
use std::env;
use std::time::Duration;

const VARS: &[&str] = &[
    "ENVIRONMENT",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_API_BASE",
    "UPSTREAM_TIMEOUT_SECS",
    "MAX_UPLOAD_BYTES",
    "CORS_ALLOWED_ORIGINS",
    "LOG_LEVEL",
    "OTLP_ENDPOINT",
    "APP__PORT",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_when_env_is_empty() {
    clear_env();

    let config = AnalysisConfig::load().expect("config loads");

    assert!(config.gemini.api_key.is_none());
    assert_eq!(config.gemini.model, "gemini-2.5-flash-preview-05-20");
    assert_eq!(
        config.gemini.api_base,
        "https://generativelanguage.googleapis.com/v1beta"
    );
    assert_eq!(config.gemini.timeout(), Duration::from_secs(60));
    assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
    assert_eq!(config.server.cors_allowed_origins.len(), 4);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.otlp_endpoint.is_none());
    assert_eq!(config.common.port, 8080);
}

#[test]
#[serial]
fn env_overrides_are_applied() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "  secret-key  ");
    env::set_var("GEMINI_MODEL", "gemini-pro-vision");
    env::set_var("GEMINI_API_BASE", "http://localhost:9999/v1beta");
    env::set_var("UPSTREAM_TIMEOUT_SECS", "15");
    env::set_var("MAX_UPLOAD_BYTES", "1048576");
    env::set_var("CORS_ALLOWED_ORIGINS", "*");
    env::set_var("LOG_LEVEL", "debug");
    env::set_var("OTLP_ENDPOINT", "http://localhost:4317");
    env::set_var("APP__PORT", "9090");

    let result = AnalysisConfig::load();
    clear_env();
    let config = result.expect("config loads");

    assert_eq!(
        config.gemini.api_key.as_ref().map(|k| k.expose_secret().as_str()),
        Some("secret-key")
    );
    assert_eq!(config.gemini.model, "gemini-pro-vision");
    assert_eq!(config.gemini.api_base, "http://localhost:9999/v1beta");
    assert_eq!(config.gemini.timeout_secs, 15);
    assert_eq!(config.server.max_upload_bytes, 1_048_576);
    assert_eq!(config.server.cors_allowed_origins, vec!["*".to_string()]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.logging.otlp_endpoint.as_deref(),
        Some("http://localhost:4317")
    );
    assert_eq!(config.common.port, 9090);
}

#[test]
#[serial]
fn blank_api_key_is_treated_as_missing() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "   ");

    let result = AnalysisConfig::load();
    clear_env();

    assert!(result.expect("config loads").gemini.api_key.is_none());
}

#[test]
#[serial]
fn invalid_timeout_is_rejected() {
    clear_env();
    env::set_var("UPSTREAM_TIMEOUT_SECS", "soon");

    let result = AnalysisConfig::load();
    clear_env();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("UPSTREAM_TIMEOUT_SECS"));
}

#[test]
#[serial]
fn production_requires_api_key() {
    clear_env();
    env::set_var("ENVIRONMENT", "prod");

    let result = AnalysisConfig::load();
    clear_env();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[test]
#[serial]
fn production_with_api_key_loads() {
    clear_env();
    env::set_var("ENVIRONMENT", "prod");
    env::set_var("GEMINI_API_KEY", "prod-key");

    let result = AnalysisConfig::load();
    clear_env();

    assert!(result.expect("config loads").gemini.has_api_key());
}
