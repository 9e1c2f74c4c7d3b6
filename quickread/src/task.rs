//! Task request types: what the caller submits for one user action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use model_spec_core::ActionType;

/// Kind of content extracted from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Selected text, article text or PDF text.
    Text,
    /// A single image as a `data:` URL. Never segmented.
    Image,
    /// Video captions joined by newlines.
    Captions,
    /// Page text followed by generated descriptions of its images.
    Ad,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "text",
            MediaType::Image => "image",
            MediaType::Captions => "captions",
            MediaType::Ad => "ad",
        }
    }

    /// Whether inputs of this kind are split into chunks before dispatch.
    pub fn is_segmentable(&self) -> bool {
        !matches!(self, MediaType::Image)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "captions" => Ok(Self::Captions),
            "ad" => Ok(Self::Ad),
            _ => Err(format!(
                "unknown media type: {} (use text, image, captions or ad)",
                s
            )),
        }
    }
}

/// One user action. Immutable once built; the runner only borrows or clones it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub action_type: ActionType,
    pub media_type: MediaType,
    /// Model alias as chosen in the UI (e.g. `"2.0-flash"`, or `"zz"` for the user model).
    pub language_model: String,
    /// Target language code (e.g. `"en"`, `"zh_cn"`, or `"zz"` for the user language).
    pub language_code: String,
    pub input: String,
}

impl TaskRequest {
    pub fn new(
        action_type: ActionType,
        media_type: MediaType,
        language_model: impl Into<String>,
        language_code: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            media_type,
            language_model: language_model.into(),
            language_code: language_code.into(),
            input: input.into(),
        }
    }
}

/// Per-invocation switches sent alongside a [`TaskRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOptions {
    /// Reuse cached results for chunks seen before. The popup's first render uses the
    /// cache; an explicit re-run does not.
    pub use_cache: bool,
    /// Stream partial text. `None` takes the value from settings.
    pub streaming: Option<bool>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            streaming: None,
        }
    }
}

/// Model alias that selects the user-configured model id.
pub const USER_MODEL_ALIAS: &str = "zz";

/// Maps a UI model alias to a backend model id.
///
/// `"zz"` selects `user_model_id`; ids already starting with `gemini-` pass through;
/// any other alias gets the `gemini-` prefix.
pub fn resolve_model_id(language_model: &str, user_model_id: &str) -> String {
    let alias = language_model.trim();
    if alias == USER_MODEL_ALIAS {
        user_model_id.trim().to_string()
    } else if alias.starts_with("gemini-") {
        alias.to_string()
    } else {
        format!("gemini-{}", alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_gets_gemini_prefix() {
        assert_eq!(resolve_model_id("2.0-flash", "x"), "gemini-2.0-flash");
        assert_eq!(resolve_model_id("1.5-pro", "x"), "gemini-1.5-pro");
    }

    #[test]
    fn user_alias_selects_user_model() {
        assert_eq!(
            resolve_model_id("zz", "gemini-2.0-flash-001"),
            "gemini-2.0-flash-001"
        );
    }

    #[test]
    fn full_id_passes_through() {
        assert_eq!(resolve_model_id("gemini-1.5-flash", "x"), "gemini-1.5-flash");
    }

    #[test]
    fn media_type_parse_and_segmentable() {
        assert_eq!("Captions".parse::<MediaType>(), Ok(MediaType::Captions));
        assert!("video".parse::<MediaType>().is_err());
        assert!(!MediaType::Image.is_segmentable());
        assert!(MediaType::Ad.is_segmentable());
    }

    #[test]
    fn request_serializes_camel_case() {
        let req = TaskRequest::new(
            ActionType::Translate,
            MediaType::Text,
            "2.0-flash",
            "ja",
            "hello",
        );
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["actionType"], "translate");
        assert_eq!(v["mediaType"], "text");
        assert_eq!(v["languageModel"], "2.0-flash");
    }
}
