//! Scripted backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{Content, GenerateResponse, GenerationResult};
use super::{GenerationBackend, PartialText};

/// Returns scripted results in order, then the fallback result for every later call.
///
/// Records the content of every call. With [`MockBackend::with_stream_by_char`] the
/// streaming path sends the first candidate's text one character at a time.
pub struct MockBackend {
    script: Mutex<VecDeque<GenerationResult>>,
    fallback: GenerationResult,
    calls: AtomicUsize,
    received: Mutex<Vec<Vec<Content>>>,
    delay: Option<Duration>,
    stream_by_char: bool,
}

impl MockBackend {
    /// Every call answers with `text` (status 200, finish reason STOP).
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_result(GenerationResult::success(
            200,
            GenerateResponse::with_text(text),
        ))
    }

    /// Every call answers with `result`.
    pub fn with_result(result: GenerationResult) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: result,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            delay: None,
            stream_by_char: false,
        }
    }

    /// Answers with `results` in order; once exhausted, repeats the last one.
    pub fn scripted(results: Vec<GenerationResult>) -> Self {
        let fallback = results
            .last()
            .cloned()
            .unwrap_or_else(|| GenerationResult::success(200, GenerateResponse::with_text("")));
        let mut mock = Self::with_result(fallback);
        mock.script = Mutex::new(results.into());
        mock
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_stream_by_char(mut self) -> Self {
        self.stream_by_char = true;
        self
    }

    /// Number of calls that reached the backend (counted on entry).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Content of every call, in call order.
    pub fn received(&self) -> Vec<Vec<Content>> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    async fn next_result(&self, content: &[Content]) -> GenerationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(content.to_vec());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(
        &self,
        _api_key: &str,
        _model_id: &str,
        content: &[Content],
    ) -> GenerationResult {
        self.next_result(content).await
    }

    async fn stream_generate(
        &self,
        _api_key: &str,
        _model_id: &str,
        content: &[Content],
        partial_tx: Option<mpsc::Sender<PartialText>>,
    ) -> GenerationResult {
        let result = self.next_result(content).await;
        let Some(tx) = partial_tx else {
            return result;
        };
        let text = result
            .body
            .as_ref()
            .and_then(GenerateResponse::first_candidate_text)
            .unwrap_or_default();
        if text.is_empty() {
            return result;
        }
        if self.stream_by_char {
            for c in text.chars() {
                let _ = tx.send(PartialText { text: c.to_string() }).await;
            }
        } else {
            let _ = tx.send(PartialText { text }).await;
        }
        result
    }
}
