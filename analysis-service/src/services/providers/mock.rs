//! Mock provider implementation for testing.

use super::{InlineImage, ProviderError, VisionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock vision provider with a canned reply.
///
/// `calls` counts requests that would have reached the upstream; an
/// unconfigured mock rejects before counting, like the real provider.
pub struct MockVisionProvider {
    reply: Result<String, ProviderError>,
    configured: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, InlineImage)>>,
}

impl MockVisionProvider {
    /// Replies with `text` as the model output.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(Ok(text.into()), true)
    }

    /// Fails every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(Err(error), true)
    }

    /// Behaves as if no API key were configured.
    pub fn unconfigured() -> Self {
        Self::new(Ok(String::new()), false)
    }

    fn new(reply: Result<String, ProviderError>, configured: bool) -> Self {
        Self {
            reply,
            configured,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt and image of the most recent counted call.
    pub fn last_request(&self) -> Option<(String, InlineImage)> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock vision provider has no API key".to_string(),
            ));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some((prompt.to_string(), image.clone()));
        }

        self.reply.clone()
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
