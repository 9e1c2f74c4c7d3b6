//! Request content and response shapes of the generateContent API.

use serde::{Deserialize, Serialize};

/// Finish reason of a candidate that completed normally.
pub const FINISH_REASON_STOP: &str = "STOP";

/// Inline binary payload (base64) with its mime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// One part of a content turn: text, inline data, or (in responses) both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        alias = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// A role-tagged turn (`"user"` or `"model"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

/// Successful response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Body with one normally finished candidate carrying `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: Some(FINISH_REASON_STOP.to_string()),
            }],
            ..Default::default()
        }
    }

    /// Text of the first candidate, if it has any content.
    pub fn first_candidate_text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::text)
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// Error payload of a failed call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Parses `{"error": {...}}`; falls back to the raw body as the message.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| Self::new(body.trim()))
    }
}

/// Final result of one backend call. Immutable once stored in the cache.
///
/// Exactly one of `body` (when `ok`) and `error` (when not) is set. Transport failures
/// use `status == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub ok: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<GenerateResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// Content that was sent, kept for the result history.
    #[serde(default)]
    pub request_content: Vec<Content>,
}

impl GenerationResult {
    pub fn success(status: u16, body: GenerateResponse) -> Self {
        Self {
            ok: true,
            status,
            body: Some(body),
            error: None,
            request_content: Vec::new(),
        }
    }

    pub fn failure(status: u16, error: ApiError) -> Self {
        Self {
            ok: false,
            status,
            body: None,
            error: Some(error),
            request_content: Vec::new(),
        }
    }

    /// Failure that never reached the API (connection, timeout, undecodable body).
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::failure(0, ApiError::new(message))
    }

    pub fn with_request_content(mut self, content: Vec<Content>) -> Self {
        self.request_content = content;
        self
    }

    pub fn error_message(&self) -> &str {
        self.error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parts_serialize_in_api_shape() {
        let content = Content::user(vec![Part::text("hi"), Part::inline("image/png", "AAAA")]);
        let v = serde_json::to_value(&content).unwrap();
        assert_eq!(v["role"], "user");
        assert_eq!(v["parts"][0]["text"], "hi");
        assert!(v["parts"][0].get("inline_data").is_none());
        assert_eq!(v["parts"][1]["inline_data"]["mime_type"], "image/png");
    }

    #[test]
    fn response_body_parses_camel_case() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " world"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates[0].finish_reason.as_deref(), Some("STOP"));
        assert_eq!(parsed.candidates[0].content.as_ref().unwrap().text(), "Hello world");
        assert_eq!(parsed.usage_metadata.unwrap().total_token_count, 5);
    }

    #[test]
    fn prompt_feedback_block_reason() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_eq!(parsed.block_reason(), Some("SAFETY"));
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn api_error_from_body_and_fallback() {
        let e = ApiError::from_body(
            r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(e.code, Some(400));
        assert_eq!(e.message, "API key not valid.");

        let raw = ApiError::from_body("Bad Gateway\n");
        assert_eq!(raw.message, "Bad Gateway");
    }
}
