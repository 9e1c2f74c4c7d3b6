//! Classification of generation results and the final task report.

use serde::Serialize;

use crate::llm::{Content, GenerationResult, FINISH_REASON_STOP};

/// Reported when a candidate stops without a finish reason.
pub const FINISH_REASON_UNSPECIFIED: &str = "FINISH_REASON_UNSPECIFIED";

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskOutcome {
    /// Every chunk produced text.
    Completed,
    /// Backend, HTTP or transport failure (`status == 0` when no response arrived).
    Error { status: u16, message: String },
    PromptBlocked { reason: String },
    ResponseBlocked { reason: String },
    /// Success status without a usable candidate.
    UnexpectedResponse,
    /// The request could not be built (bad image data URL, missing custom prompt).
    InvalidInput { message: String },
    /// The caller cancelled; output holds the chunks finished before that.
    Cancelled,
}

impl TaskOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Error { .. } => "error",
            TaskOutcome::PromptBlocked { .. } => "promptBlocked",
            TaskOutcome::ResponseBlocked { .. } => "responseBlocked",
            TaskOutcome::UnexpectedResponse => "unexpectedResponse",
            TaskOutcome::InvalidInput { .. } => "invalidInput",
            TaskOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Result of classifying one chunk's generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkVerdict {
    /// Normal candidate: text to append, continue with the next chunk.
    Text(String),
    /// Stop the task with this outcome.
    Stop(TaskOutcome),
}

/// Classifies a result, checked in order: backend error, prompt block, response block
/// (first candidate not finished with `STOP`), normal text, anything else unexpected.
pub fn classify(result: &GenerationResult) -> ChunkVerdict {
    if !result.ok {
        return ChunkVerdict::Stop(TaskOutcome::Error {
            status: result.status,
            message: result.error_message().to_string(),
        });
    }
    let Some(body) = result.body.as_ref() else {
        return ChunkVerdict::Stop(TaskOutcome::UnexpectedResponse);
    };
    if let Some(reason) = body.block_reason() {
        return ChunkVerdict::Stop(TaskOutcome::PromptBlocked {
            reason: reason.to_string(),
        });
    }
    let Some(candidate) = body.candidates.first() else {
        return ChunkVerdict::Stop(TaskOutcome::UnexpectedResponse);
    };
    match candidate.finish_reason.as_deref() {
        Some(FINISH_REASON_STOP) => {}
        other => {
            return ChunkVerdict::Stop(TaskOutcome::ResponseBlocked {
                reason: other.unwrap_or(FINISH_REASON_UNSPECIFIED).to_string(),
            })
        }
    }
    match candidate.content.as_ref() {
        Some(content) => ChunkVerdict::Text(content.text()),
        None => ChunkVerdict::Stop(TaskOutcome::UnexpectedResponse),
    }
}

/// Everything a finished task produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub outcome: TaskOutcome,
    /// Text of each finished chunk followed by a blank line, in chunk order.
    pub output: String,
    pub chunks_total: usize,
    pub chunks_processed: usize,
    pub backend_calls: usize,
    pub cache_hits: usize,
    /// Content of the last request sent (or replayed from the cache).
    pub request_content: Vec<Content>,
}

impl TaskReport {
    /// Report for a task that stopped before dispatching any chunk.
    pub fn stopped(outcome: TaskOutcome, chunks_total: usize) -> Self {
        Self {
            outcome,
            output: String::new(),
            chunks_total,
            chunks_processed: 0,
            backend_calls: 0,
            cache_hits: 0,
            request_content: Vec::new(),
        }
    }

    /// User-visible content: the aggregate, or the message that replaces it.
    pub fn content(&self) -> String {
        match &self.outcome {
            TaskOutcome::Completed | TaskOutcome::Cancelled => self.output.clone(),
            TaskOutcome::Error { status, message } => format!("Error: {}\n\n{}", status, message),
            TaskOutcome::PromptBlocked { reason } => {
                format!("The prompt was blocked. Reason: {}", reason)
            }
            TaskOutcome::ResponseBlocked { reason } => {
                format!("The response was blocked. Reason: {}", reason)
            }
            TaskOutcome::UnexpectedResponse => "Unexpected response.".to_string(),
            TaskOutcome::InvalidInput { message } => format!("Error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ApiError, Candidate, GenerateResponse, PromptFeedback};

    fn ok(body: GenerateResponse) -> GenerationResult {
        GenerationResult::success(200, body)
    }

    #[test]
    fn error_result_stops_with_status_and_message() {
        let r = GenerationResult::failure(400, ApiError::new("API key not valid"));
        assert_eq!(
            classify(&r),
            ChunkVerdict::Stop(TaskOutcome::Error {
                status: 400,
                message: "API key not valid".to_string()
            })
        );
    }

    #[test]
    fn prompt_block_wins_over_candidates() {
        let mut body = GenerateResponse::with_text("x");
        body.prompt_feedback = Some(PromptFeedback {
            block_reason: Some("SAFETY".to_string()),
        });
        assert_eq!(
            classify(&ok(body)),
            ChunkVerdict::Stop(TaskOutcome::PromptBlocked {
                reason: "SAFETY".to_string()
            })
        );
    }

    #[test]
    fn non_stop_finish_reason_is_response_block() {
        let mut body = GenerateResponse::with_text("partial");
        body.candidates[0].finish_reason = Some("RECITATION".to_string());
        assert_eq!(
            classify(&ok(body)),
            ChunkVerdict::Stop(TaskOutcome::ResponseBlocked {
                reason: "RECITATION".to_string()
            })
        );

        let body = GenerateResponse {
            candidates: vec![Candidate::default()],
            ..Default::default()
        };
        assert_eq!(
            classify(&ok(body)),
            ChunkVerdict::Stop(TaskOutcome::ResponseBlocked {
                reason: FINISH_REASON_UNSPECIFIED.to_string()
            })
        );
    }

    #[test]
    fn missing_candidates_or_content_is_unexpected() {
        assert_eq!(
            classify(&ok(GenerateResponse::default())),
            ChunkVerdict::Stop(TaskOutcome::UnexpectedResponse)
        );
        let mut body = GenerateResponse::with_text("x");
        body.candidates[0].content = None;
        assert_eq!(
            classify(&ok(body)),
            ChunkVerdict::Stop(TaskOutcome::UnexpectedResponse)
        );
    }

    #[test]
    fn normal_candidate_yields_text() {
        assert_eq!(
            classify(&ok(GenerateResponse::with_text("Hello"))),
            ChunkVerdict::Text("Hello".to_string())
        );
    }

    #[test]
    fn content_replaces_aggregate_on_failure() {
        let mut report = TaskReport::stopped(TaskOutcome::Completed, 1);
        report.output = "first\n\n".to_string();
        assert_eq!(report.content(), "first\n\n");
        report.outcome = TaskOutcome::Error {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(report.content(), "Error: 503\n\noverloaded");
        report.outcome = TaskOutcome::UnexpectedResponse;
        assert_eq!(report.content(), "Unexpected response.");
        report.outcome = TaskOutcome::Cancelled;
        assert_eq!(report.content(), "first\n\n");
    }
}
