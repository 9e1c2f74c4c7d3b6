//! Gemini generateContent client implementing [`GenerationBackend`].
//!
//! - `generate`: `POST {base}/v1beta/models/{model}:generateContent`
//! - `stream_generate`: `POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse`
//!
//! The API key goes in the `x-goog-api-key` header. Streamed chunks are merged into a
//! single body: text of the first candidate concatenated, the last non-empty finish
//! reason, the first prompt feedback and the last usage metadata.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::error::BackendError;
use super::sse::SseDecoder;
use super::types::{
    ApiError, Candidate, Content, GenerateResponse, GenerationResult, Part, PromptFeedback,
    UsageMetadata,
};
use super::{GenerationBackend, PartialText};

/// Public endpoint of the Generative Language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Content],
}

/// HTTP client for the Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Custom base URL (proxy, local stub). A trailing slash is ignored.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL from `QUICKREAD_API_BASE`, else the public endpoint.
    pub fn from_env() -> Self {
        match std::env::var("QUICKREAD_API_BASE") {
            Ok(base) if !base.trim().is_empty() => Self::with_base_url(base.trim()),
            _ => Self::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_url(&self, model_id: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model_id, method)
    }

    async fn post(
        &self,
        url: &str,
        api_key: &str,
        content: &[Content],
    ) -> Result<reqwest::Response, BackendError> {
        Ok(self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest { contents: content })
            .send()
            .await?)
    }

    /// Reads a non-2xx response into a failed result.
    async fn failure_from(response: reqwest::Response) -> GenerationResult {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_body(&body);
        warn!(status, message = %error.message, "generation api error");
        GenerationResult::failure(status, error)
    }

    async fn try_generate(
        &self,
        api_key: &str,
        model_id: &str,
        content: &[Content],
    ) -> Result<GenerationResult, BackendError> {
        let url = self.model_url(model_id, "generateContent");
        debug!(model_id, parts = content.len(), "generateContent");
        let response = self.post(&url, api_key, content).await?;
        if !response.status().is_success() {
            return Ok(Self::failure_from(response).await);
        }
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str::<GenerateResponse>(&text).map_err(|e| {
            BackendError::Decode {
                status,
                message: e.to_string(),
            }
        })?;
        Ok(GenerationResult::success(status, body))
    }

    async fn try_stream_generate(
        &self,
        api_key: &str,
        model_id: &str,
        content: &[Content],
        partial_tx: Option<mpsc::Sender<PartialText>>,
    ) -> Result<GenerationResult, BackendError> {
        let url = format!(
            "{}?alt=sse",
            self.model_url(model_id, "streamGenerateContent")
        );
        debug!(model_id, parts = content.len(), "streamGenerateContent");
        let response = self.post(&url, api_key, content).await?;
        if !response.status().is_success() {
            return Ok(Self::failure_from(response).await);
        }
        let status = response.status().as_u16();

        let mut decoder = SseDecoder::new();
        let mut merged = StreamMerge::default();
        let mut bytes = response.bytes_stream();
        while let Some(chunk) = bytes.next().await {
            for event in decoder.push(&chunk?) {
                merged.apply_event(status, &event, partial_tx.as_ref()).await?;
            }
        }
        if let Some(event) = decoder.finish() {
            merged.apply_event(status, &event, partial_tx.as_ref()).await?;
        }
        Ok(GenerationResult::success(status, merged.into_response()))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        content: &[Content],
    ) -> GenerationResult {
        self.try_generate(api_key, model_id, content)
            .await
            .unwrap_or_else(|e| {
                warn!(model_id, error = %e, "generation request failed");
                GenerationResult::from(e)
            })
    }

    async fn stream_generate(
        &self,
        api_key: &str,
        model_id: &str,
        content: &[Content],
        partial_tx: Option<mpsc::Sender<PartialText>>,
    ) -> GenerationResult {
        self.try_stream_generate(api_key, model_id, content, partial_tx)
            .await
            .unwrap_or_else(|e| {
                warn!(model_id, error = %e, "generation request failed");
                GenerationResult::from(e)
            })
    }
}

/// Folds streamed response chunks into one body.
#[derive(Default)]
struct StreamMerge {
    text: String,
    saw_candidate: bool,
    finish_reason: Option<String>,
    prompt_feedback: Option<PromptFeedback>,
    usage: Option<UsageMetadata>,
}

impl StreamMerge {
    /// Merges one chunk and returns the text it added.
    fn apply(&mut self, chunk: GenerateResponse) -> String {
        if self.prompt_feedback.is_none() {
            self.prompt_feedback = chunk.prompt_feedback;
        }
        if chunk.usage_metadata.is_some() {
            self.usage = chunk.usage_metadata;
        }
        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return String::new();
        };
        self.saw_candidate = true;
        if let Some(reason) = candidate.finish_reason.filter(|r| !r.is_empty()) {
            self.finish_reason = Some(reason);
        }
        let delta = candidate.content.map(|c| c.text()).unwrap_or_default();
        self.text.push_str(&delta);
        delta
    }

    async fn apply_event(
        &mut self,
        status: u16,
        event: &str,
        partial_tx: Option<&mpsc::Sender<PartialText>>,
    ) -> Result<(), BackendError> {
        let chunk: GenerateResponse =
            serde_json::from_str(event).map_err(|e| BackendError::Decode {
                status,
                message: e.to_string(),
            })?;
        let delta = self.apply(chunk);
        trace!(len = delta.len(), "stream delta");
        if let (Some(tx), false) = (partial_tx, delta.is_empty()) {
            // Receiver may be gone; the final result still counts.
            let _ = tx.send(PartialText { text: delta }).await;
        }
        Ok(())
    }

    fn into_response(self) -> GenerateResponse {
        let candidates = if self.saw_candidate {
            vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text(self.text)],
                }),
                finish_reason: self.finish_reason,
            }]
        } else {
            Vec::new()
        };
        GenerateResponse {
            candidates,
            prompt_feedback: self.prompt_feedback,
            usage_metadata: self.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn model_url_strips_trailing_slash() {
        let client = GeminiClient::with_base_url("http://localhost:9999/");
        assert_eq!(
            client.model_url("gemini-2.0-flash", "generateContent"),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn merge_concatenates_text_and_keeps_last_finish_reason() {
        let mut m = StreamMerge::default();
        assert_eq!(
            m.apply(chunk(r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#)),
            "Hel"
        );
        assert_eq!(
            m.apply(chunk(
                r#"{"candidates":[{"content":{"parts":[{"text":"lo"}]},"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":9}}"#
            )),
            "lo"
        );
        let body = m.into_response();
        assert_eq!(body.first_candidate_text().as_deref(), Some("Hello"));
        assert_eq!(body.candidates[0].finish_reason.as_deref(), Some("STOP"));
        assert_eq!(body.usage_metadata.unwrap().total_token_count, 9);
    }

    #[test]
    fn merge_keeps_mid_stream_block() {
        let mut m = StreamMerge::default();
        m.apply(chunk(r#"{"candidates":[{"content":{"parts":[{"text":"partial"}]}}]}"#));
        m.apply(chunk(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#));
        let body = m.into_response();
        assert_eq!(body.candidates[0].finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn merge_without_candidates_has_none() {
        let mut m = StreamMerge::default();
        m.apply(chunk(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#));
        let body = m.into_response();
        assert!(body.candidates.is_empty());
        assert_eq!(body.block_reason(), Some("OTHER"));
    }

    #[tokio::test]
    async fn apply_event_forwards_non_empty_deltas() {
        let mut m = StreamMerge::default();
        let (tx, mut rx) = mpsc::channel(4);
        m.apply_event(200, r#"{"candidates":[{"content":{"parts":[{"text":"a"}]}}]}"#, Some(&tx))
            .await
            .unwrap();
        m.apply_event(200, r#"{"candidates":[{"finishReason":"STOP"}]}"#, Some(&tx))
            .await
            .unwrap();
        drop(tx);
        assert_eq!(rx.recv().await.unwrap().text, "a");
        assert!(rx.recv().await.is_none());
        assert!(matches!(
            m.apply_event(200, "not json", None).await,
            Err(BackendError::Decode { status: 200, .. })
        ));
    }
}
