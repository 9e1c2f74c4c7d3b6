//! Dispatcher: runs a task's chunks through the response cache and the generation backend.
//!
//! Chunks are processed strictly in order; chunk *i + 1* is not looked up or sent before
//! chunk *i* has been classified. The first chunk that does not yield text stops the task
//! (see [`classify`]). Only `ok` results are written to the cache.
//!
//! # Events
//!
//! [`Dispatcher::stream`] runs a job on a spawned task and returns a `ReceiverStream` of
//! [`DispatchEvent`]s: `Started`, then per chunk any number of `Partial` (streaming only)
//! and one `ChunkDone`, then exactly one `Finished` carrying the [`TaskReport`]. Partials
//! are progress only; the report is authoritative.
//!
//! # Cancellation
//!
//! The backend call is the only suspension point and races the job's
//! [`CancellationToken`]. A cancelled call is dropped: nothing is cached and the aggregate
//! keeps only chunks that finished before.

mod outcome;

pub use outcome::{classify, ChunkVerdict, TaskOutcome, TaskReport, FINISH_REASON_UNSPECIFIED};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::llm::{Content, GenerationBackend, GenerationResult, PartialText};
use crate::prompts::PromptContext;
use crate::task::TaskRequest;

/// Capacity of the event channel returned by [`Dispatcher::stream`].
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

const PARTIAL_CHANNEL_CAPACITY: usize = 32;

/// Progress of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    Started {
        chunks: usize,
    },
    /// Streamed text delta for the chunk being generated.
    Partial {
        chunk_index: usize,
        text: String,
    },
    /// A chunk yielded text (already appended to the aggregate).
    ChunkDone {
        chunk_index: usize,
        text: String,
        cached: bool,
    },
    Finished(TaskReport),
}

/// One task ready for dispatch: request, resolved model id, chunks and switches.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub request: Arc<TaskRequest>,
    pub model_id: String,
    pub api_key: String,
    pub chunks: Vec<String>,
    pub use_cache: bool,
    pub streaming: bool,
    pub prompt: PromptContext,
}

/// Runs jobs against a backend and a shared response cache.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn GenerationBackend>,
    cache: Arc<ResponseCache>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn GenerationBackend>, cache: Arc<ResponseCache>) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn backend(&self) -> Arc<dyn GenerationBackend> {
        self.backend.clone()
    }

    /// Runs `job` on a spawned task; events arrive on the returned stream, ending with
    /// `Finished`. Dropping the stream does not cancel the job; use the token.
    pub fn stream(&self, job: DispatchJob, cancel: CancellationToken) -> ReceiverStream<DispatchEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let report = dispatcher.run(&job, &cancel, Some(&tx)).await;
            let _ = tx.send(DispatchEvent::Finished(report)).await;
        });
        ReceiverStream::new(rx)
    }

    /// Processes every chunk of `job` in order and returns the report. Events other than
    /// `Finished` are sent to `events` when given.
    pub async fn run(
        &self,
        job: &DispatchJob,
        cancel: &CancellationToken,
        events: Option<&mpsc::Sender<DispatchEvent>>,
    ) -> TaskReport {
        let mut report = TaskReport::stopped(TaskOutcome::Completed, job.chunks.len());
        emit(
            events,
            DispatchEvent::Started {
                chunks: job.chunks.len(),
            },
        )
        .await;

        for (chunk_index, chunk) in job.chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                report.outcome = TaskOutcome::Cancelled;
                break;
            }
            let key = CacheKey::for_chunk(&job.request, chunk);
            let cached = if job.use_cache {
                self.cache.lookup(&key).await
            } else {
                None
            };

            let (result, from_cache) = match cached {
                Some(result) => {
                    debug!(chunk_index, "response cache hit");
                    report.cache_hits += 1;
                    (result, true)
                }
                None => {
                    debug!(chunk_index, use_cache = job.use_cache, "response cache miss");
                    let content = match job.prompt.content_for(chunk) {
                        Ok(content) => content,
                        Err(e) => {
                            warn!(chunk_index, error = %e, "request content not built");
                            report.outcome = TaskOutcome::InvalidInput {
                                message: e.to_string(),
                            };
                            break;
                        }
                    };
                    report.backend_calls += 1;
                    let call = self.call_backend(job, &content, chunk_index, events);
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!(chunk_index, "backend call cancelled");
                            report.outcome = TaskOutcome::Cancelled;
                            break;
                        }
                        result = call => result,
                    };
                    let result = result.with_request_content(content);
                    if result.ok {
                        self.cache.insert(key, result.clone()).await;
                    }
                    (result, false)
                }
            };

            report.request_content = result.request_content.clone();
            match classify(&result) {
                ChunkVerdict::Text(text) => {
                    report.output.push_str(&text);
                    report.output.push_str("\n\n");
                    report.chunks_processed += 1;
                    emit(
                        events,
                        DispatchEvent::ChunkDone {
                            chunk_index,
                            text,
                            cached: from_cache,
                        },
                    )
                    .await;
                }
                ChunkVerdict::Stop(outcome) => {
                    if let TaskOutcome::Error { status, message } = &outcome {
                        warn!(chunk_index, status, message = %message, "backend error");
                    } else {
                        debug!(chunk_index, outcome = outcome.kind(), "task stopped");
                    }
                    report.outcome = outcome;
                    break;
                }
            }
        }
        report
    }

    async fn call_backend(
        &self,
        job: &DispatchJob,
        content: &[Content],
        chunk_index: usize,
        events: Option<&mpsc::Sender<DispatchEvent>>,
    ) -> GenerationResult {
        if !job.streaming {
            return self
                .backend
                .generate(&job.api_key, &job.model_id, content)
                .await;
        }
        let (partial_tx, mut partial_rx) = mpsc::channel::<PartialText>(PARTIAL_CHANNEL_CAPACITY);
        let generate =
            self.backend
                .stream_generate(&job.api_key, &job.model_id, content, Some(partial_tx));
        let forward = async {
            while let Some(partial) = partial_rx.recv().await {
                emit(
                    events,
                    DispatchEvent::Partial {
                        chunk_index,
                        text: partial.text,
                    },
                )
                .await;
            }
        };
        let (result, ()) = tokio::join!(generate, forward);
        result
    }
}

/// Best effort: a receiver that went away just stops seeing progress.
async fn emit(events: Option<&mpsc::Sender<DispatchEvent>>, event: DispatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
