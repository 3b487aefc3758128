//! The image analysis relay.
//!
//! Validates the upload, wraps it with the inventory prompt, hands it to a
//! [`VisionProvider`] and turns the model's text back into JSON.

use crate::services::providers::{InlineImage, ProviderError, VisionProvider};
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Uploads are always forwarded as JPEG.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Instruction sent with every image.
pub const ANALYSIS_PROMPT: &str = r#"
You are BizPilot, an expert inventory management assistant for small businesses in Dhaka, Bangladesh. Your analysis should be practical, clear, and actionable.

Analyze the provided image of a user's inventory and provide a structured analysis.
Your response MUST be a valid JSON object and nothing else. Do not include markdown formatting like ```json.

JSON Output Instructions:
1. 'items': Create a list of objects. Each object should have a 'name' (string) and 'estimated_count' (integer).
2. 'quality_assessment': Provide a 'rating' (string, e.g., "Excellent," "Good," "Fair," "Poor") and 'notes' (string) based on visual cues like packaging, condition, and organization.
3. 'optimizations': Provide a list of 2-3 concrete, actionable suggestion strings for improvement.
4. 'safety_check': As a safety filter, provide a 'bias_detected' (boolean) and 'privacy_concern' (boolean) flag. If you see people, faces, or personal identifiable information, set privacy_concern to true.
"#;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    MissingConfiguration(String),

    #[error("Analysis service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Analysis service returned HTTP {status}")]
    UpstreamError { status: u16, message: String },

    #[error("Analysis service returned an unexpected response: {0}")]
    MalformedUpstreamResponse(String),

    /// `raw_text` is for logs only; it is not part of the message.
    #[error("Model output is not valid JSON: {source}")]
    InvalidModelOutput {
        raw_text: String,
        source: serde_json::Error,
    },
}

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AnalysisError::MissingConfiguration(msg),
            ProviderError::NetworkError(msg) => AnalysisError::UpstreamUnavailable(msg),
            ProviderError::Timeout(after) => {
                AnalysisError::UpstreamUnavailable(format!("request timed out after {:?}", after))
            }
            ProviderError::ApiError { status, message } => {
                AnalysisError::UpstreamError { status, message }
            }
            ProviderError::MalformedResponse(msg) => AnalysisError::MalformedUpstreamResponse(msg),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidInput(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            AnalysisError::MissingConfiguration(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            other => AppError::UpstreamError(other.to_string()),
        }
    }
}

/// Forwards images to a vision provider and returns its JSON verdict.
#[derive(Clone)]
pub struct AnalysisRelay {
    provider: Arc<dyn VisionProvider>,
}

impl AnalysisRelay {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Analyze one JPEG image. The parsed model output is returned verbatim.
    #[tracing::instrument(skip_all, fields(image_bytes = image.len()))]
    pub async fn analyze(&self, image: &[u8]) -> Result<Value, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Uploaded image is empty".to_string(),
            ));
        }

        let inline = InlineImage::encode(image, IMAGE_MIME_TYPE);
        let text = self
            .provider
            .generate(ANALYSIS_PROMPT, &inline)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Vision provider call failed");
                AnalysisError::from(e)
            })?;

        parse_model_output(&text)
    }
}

/// Parse model text as JSON after removing any code fence around it.
pub fn parse_model_output(text: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| {
        tracing::error!(error = %e, raw_text = %text, "Model output is not valid JSON");
        AnalysisError::InvalidModelOutput {
            raw_text: text.to_string(),
            source: e,
        }
    })
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````) and
/// whitespace. Unfenced text is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match strip_json_tag(rest) {
        Some(after_tag) => after_tag,
        None => match rest.find('\n') {
            // First line holds some other language tag.
            Some(newline) if is_language_tag(&rest[..newline]) => &rest[newline + 1..],
            _ => rest,
        },
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `json` directly after the fence, whether or not the payload starts on the
/// same line. Longer tags such as `jsonc` are not matched.
fn strip_json_tag(text: &str) -> Option<&str> {
    let tag = text.get(..4)?;
    let after = &text[4..];
    let joined = after
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    (tag.eq_ignore_ascii_case("json") && !joined).then_some(after)
}
