//! Gemini vision provider.
//!
//! Sends one `generateContent` request carrying the prompt and the inline
//! image, and returns the first text part of the first candidate.

use super::{InlineImage, ProviderError, VisionProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upstream bodies are logged up to this many characters.
const LOG_BODY_LIMIT: usize = 512;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    /// e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub api_base: String,
    pub timeout: Duration,
}

/// Gemini vision provider.
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NetworkError(format!(
                    "Failed to create HTTP client: {}",
                    e.without_url()
                ))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given method. The key travels as a query
    /// parameter and is never part of this string.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().trim())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("GEMINI_API_KEY is not configured".to_string())
            })
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        // Drop the URL so the key query parameter cannot leak.
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let request = GenerateContentRequest::new(prompt, image);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            image_len = image.data.len(),
            "Sending request to Gemini API"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body = %excerpt(&body),
                "Gemini API returned an error status"
            );
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let api_response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %excerpt(&body), "Gemini response is not valid JSON");
            ProviderError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = api_response.first_text().map_err(|e| {
            tracing::error!(error = %e, body = %excerpt(&body), "Unexpected Gemini response format");
            e
        })?;

        let usage = api_response.usage_metadata.unwrap_or_default();
        tracing::info!(
            model = %self.config.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            input_tokens = usage.prompt_token_count.unwrap_or(0),
            output_tokens = usage.candidates_token_count.unwrap_or(0),
            "Gemini response received"
        );

        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn new(prompt: &str, image: &InlineImage) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text {
                        text: prompt.to_string(),
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`
    fn first_text(&self) -> Result<String, ProviderError> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| ProviderError::MalformedResponse("no candidates".to_string()))?;

        let content = candidate.content.as_ref().ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        content
            .parts
            .first()
            .and_then(|part| part.text.clone())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("first part has no text".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}
