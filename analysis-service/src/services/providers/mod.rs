//! Vision provider abstractions and implementations.
//!
//! A provider performs the single upstream call: a prompt plus one inline
//! image in, the model's raw text out. Gemini is the production backend; the
//! mock stands in for it in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Base64 image payload sent inline with the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard, padded base64.
    pub data: String,
}

impl InlineImage {
    pub fn encode(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Trait for multimodal (prompt + image -> text) providers.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Send the prompt and image upstream and return the model's text output.
    async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String, ProviderError>;

    /// Whether credentials are present. Unconfigured providers fail without
    /// touching the network.
    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_image_uses_padded_standard_base64() {
        let image = InlineImage::encode(&[0xff, 0xd8, 0xff, 0xe0], "image/jpeg");
        assert_eq!(image.data, "/9j/4A==");
        assert_eq!(image.mime_type, "image/jpeg");
    }
}
