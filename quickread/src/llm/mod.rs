//! Generation backend abstraction.
//!
//! The dispatcher depends on [`GenerationBackend`], which turns request content into a
//! final [`GenerationResult`]. Failures are values, not errors: an HTTP error or a
//! dropped connection comes back as `ok == false` so every outcome flows through the
//! same classification.
//!
//! # Streaming
//!
//! `stream_generate()` accepts an optional `Sender<PartialText>` and sends text deltas as
//! they arrive. Partials are progress only; the returned result is authoritative.
//! The default implementation calls `generate()` and sends the full text as one partial.

mod error;
mod gemini;
mod mock;
mod sse;
mod types;

pub use error::BackendError;
pub use gemini::{GeminiClient, DEFAULT_API_BASE};
pub use mock::MockBackend;
pub use sse::SseDecoder;
pub use types::{
    ApiError, Candidate, Content, GenerateResponse, GenerationResult, InlineData, Part,
    PromptFeedback, UsageMetadata, FINISH_REASON_STOP,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One increment of streamed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialText {
    pub text: String,
}

/// Black-box generation operation.
///
/// Implementations: [`GeminiClient`] (HTTP) and [`MockBackend`] (scripted, for tests).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Single blocking call returning the full result.
    async fn generate(&self, api_key: &str, model_id: &str, content: &[Content])
        -> GenerationResult;

    /// Streaming call. Sends text deltas through `partial_tx` when given, then returns the
    /// merged final result.
    async fn stream_generate(
        &self,
        api_key: &str,
        model_id: &str,
        content: &[Content],
        partial_tx: Option<mpsc::Sender<PartialText>>,
    ) -> GenerationResult {
        let result = self.generate(api_key, model_id, content).await;
        if let Some(tx) = partial_tx {
            let text = result
                .body
                .as_ref()
                .and_then(GenerateResponse::first_candidate_text)
                .unwrap_or_default();
            if !text.is_empty() {
                let _ = tx.send(PartialText { text }).await;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        result: GenerationResult,
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        async fn generate(&self, _: &str, _: &str, _: &[Content]) -> GenerationResult {
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn default_stream_generate_sends_single_partial() {
        let backend = StubBackend {
            result: GenerationResult::success(200, GenerateResponse::with_text("hello")),
        };
        let (tx, mut rx) = mpsc::channel(2);
        let result = backend.stream_generate("k", "m", &[], Some(tx)).await;
        assert!(result.ok);
        assert_eq!(rx.recv().await.unwrap().text, "hello");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn default_stream_generate_sends_nothing_on_failure() {
        let backend = StubBackend {
            result: GenerationResult::failure(500, ApiError::new("boom")),
        };
        let (tx, mut rx) = mpsc::channel(2);
        let result = backend.stream_generate("k", "m", &[], Some(tx)).await;
        assert!(!result.ok);
        assert!(rx.try_recv().is_err());
    }
}
