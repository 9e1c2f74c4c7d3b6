//! System prompts and request content assembly.
//!
//! [`PromptTemplates`] holds one template per (action, media) pair, loaded from YAML (see
//! [`load`]). [`PromptContext`] binds templates to one task and turns each chunk into the
//! request content sent to the backend.

mod load;

pub use load::{default_from_embedded, load, PROMPTS_DIR_ENV, PROMPTS_FILE};

use std::sync::Arc;

use serde::Deserialize;

use crate::llm::{Content, Part};
use crate::task::{ActionType, MediaType};

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
    #[error("no prompt template for {action} on {media} input")]
    MissingTemplate {
        action: ActionType,
        media: &'static str,
    },
    #[error("no custom prompt configured for {0}")]
    MissingCustomPrompt(ActionType),
    #[error("invalid image data URL: {0}")]
    InvalidDataUrl(String),
}

/// Language code that selects the user-configured language.
pub const USER_LANGUAGE_CODE: &str = "zz";

/// Language names by language code. `zz` is resolved to the user-configured language.
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("de", "German"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("it", "Italian"),
    ("pt_br", "Brazilian Portuguese"),
    ("vi", "Vietnamese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("zh_cn", "Simplified Chinese"),
    ("zh_tw", "Traditional Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Display name for `code`; unknown codes read as English.
pub fn language_name<'a>(code: &str, user_language: &'a str) -> &'a str {
    if code == USER_LANGUAGE_CODE {
        return user_language;
    }
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or("English")
}

/// Number of summary points for an input of `input_chars` characters: 3 to 10.
pub fn summary_items(input_chars: usize) -> usize {
    (3 + input_chars / 2000).min(10)
}

/// Templates for one action, per media type. `captions` and `ad` fall back to `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaTemplates {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub captions: Option<String>,
    #[serde(default)]
    pub ad: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl MediaTemplates {
    fn get(&self, media: MediaType) -> Option<&str> {
        let specific = match media {
            MediaType::Text => None,
            MediaType::Captions => self.captions.as_deref(),
            MediaType::Ad => self.ad.as_deref(),
            MediaType::Image => return self.image.as_deref(),
        };
        specific.or(self.text.as_deref())
    }

    fn merged_over(self, base: MediaTemplates) -> MediaTemplates {
        MediaTemplates {
            text: self.text.or(base.text),
            captions: self.captions.or(base.captions),
            ad: self.ad.or(base.ad),
            image: self.image.or(base.image),
        }
    }
}

/// Built-in action templates (custom actions use the configured prompt instead).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PromptTemplates {
    #[serde(default)]
    pub summarize: MediaTemplates,
    #[serde(default)]
    pub translate: MediaTemplates,
}

impl PromptTemplates {
    /// Template text for a built-in action; `None` for custom actions.
    pub fn template(&self, action: ActionType, media: MediaType) -> Option<&str> {
        match action {
            ActionType::Summarize => self.summarize.get(media),
            ActionType::Translate => self.translate.get(media),
            ActionType::NoTextCustom | ActionType::TextCustom => None,
        }
    }

    /// Entries of `self`, with missing ones taken from `base`.
    pub fn merged_over(self, base: PromptTemplates) -> PromptTemplates {
        PromptTemplates {
            summarize: self.summarize.merged_over(base.summarize),
            translate: self.translate.merged_over(base.translate),
        }
    }
}

/// Prompt inputs for one task.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub templates: Arc<PromptTemplates>,
    pub action: ActionType,
    pub media: MediaType,
    pub language_code: String,
    pub user_language: String,
    /// Used for the custom actions.
    pub custom_prompt: Option<String>,
}

impl PromptContext {
    /// System prompt for a chunk of `chunk_chars` characters, placeholders filled.
    pub fn system_prompt(&self, chunk_chars: usize) -> Result<String, PromptError> {
        let template = if self.action.is_custom() {
            self.custom_prompt
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or(PromptError::MissingCustomPrompt(self.action))?
        } else {
            self.templates
                .template(self.action, self.media)
                .ok_or(PromptError::MissingTemplate {
                    action: self.action,
                    media: self.media.as_str(),
                })?
        };
        let language = language_name(&self.language_code, &self.user_language);
        Ok(template
            .replace("{language}", language)
            .replace("{num_items}", &summary_items(chunk_chars).to_string()))
    }

    /// Request content for one chunk: a single user turn.
    ///
    /// Images carry the prompt and the decoded data URL as two parts; everything else is
    /// one text part, `prompt + "\nText:\n" + chunk`.
    pub fn content_for(&self, chunk: &str) -> Result<Vec<Content>, PromptError> {
        let prompt = self.system_prompt(chunk.chars().count())?;
        let parts = if self.media == MediaType::Image {
            let (mime_type, data) = parse_data_url(chunk)?;
            vec![Part::text(prompt), Part::inline(mime_type, data)]
        } else {
            vec![Part::text(format!("{}\nText:\n{}", prompt, chunk))]
        };
        Ok(vec![Content::user(parts)])
    }
}

/// Splits `data:<mime>;base64,<data>` into mime type and payload.
pub fn parse_data_url(url: &str) -> Result<(&str, &str), PromptError> {
    let invalid = || PromptError::InvalidDataUrl(url.chars().take(48).collect());
    let (header, data) = url.split_once(',').ok_or_else(invalid)?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|h| h.split(';').next())
        .filter(|m| !m.is_empty())
        .ok_or_else(invalid)?;
    if data.is_empty() {
        return Err(invalid());
    }
    Ok((mime, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(action: ActionType, media: MediaType, code: &str) -> PromptContext {
        PromptContext {
            templates: Arc::new(default_from_embedded()),
            action,
            media,
            language_code: code.to_string(),
            user_language: "Turkish".to_string(),
            custom_prompt: None,
        }
    }

    #[test]
    fn language_names_resolve_user_language_and_unknown() {
        assert_eq!(language_name("ja", "Turkish"), "Japanese");
        assert_eq!(language_name("zz", "Turkish"), "Turkish");
        assert_eq!(language_name("xx", "Turkish"), "English");
    }

    #[test]
    fn summary_items_grow_with_length_and_cap_at_ten() {
        assert_eq!(summary_items(0), 3);
        assert_eq!(summary_items(1999), 3);
        assert_eq!(summary_items(2000), 4);
        assert_eq!(summary_items(14_000), 10);
        assert_eq!(summary_items(1_000_000), 10);
    }

    #[test]
    fn text_content_is_prompt_then_chunk() {
        let ctx = context(ActionType::Translate, MediaType::Text, "de");
        let content = ctx.content_for("Hallo").unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].role.as_deref(), Some("user"));
        assert_eq!(
            content[0].text(),
            "Translate the entire text into German and reply only with the translated result.\nText:\nHallo"
        );
    }

    #[test]
    fn summary_prompt_fills_item_count() {
        let ctx = context(ActionType::Summarize, MediaType::Text, "en");
        let prompt = ctx.system_prompt(4500).unwrap();
        assert!(prompt.contains("at most 5 key points"));
        assert!(prompt.contains("in English."));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn image_content_carries_inline_data() {
        let ctx = context(ActionType::Translate, MediaType::Image, "zz");
        let content = ctx.content_for("data:image/png;base64,iVBORw0KGgo=").unwrap();
        let parts = &content[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0].text.as_deref(),
            Some("Translate the image into Turkish and reply only with the translated result.")
        );
        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "iVBORw0KGgo=");
    }

    #[test]
    fn malformed_data_url_is_an_error() {
        let ctx = context(ActionType::Summarize, MediaType::Image, "en");
        assert!(matches!(
            ctx.content_for("not a data url"),
            Err(PromptError::InvalidDataUrl(_))
        ));
        assert!(parse_data_url("data:;base64,AAAA").is_err());
        assert!(parse_data_url("data:image/jpeg;base64,").is_err());
    }

    #[test]
    fn custom_actions_need_a_prompt() {
        let mut ctx = context(ActionType::TextCustom, MediaType::Text, "fr");
        assert!(matches!(
            ctx.system_prompt(10),
            Err(PromptError::MissingCustomPrompt(ActionType::TextCustom))
        ));
        ctx.custom_prompt = Some("Explain this in {language}.".to_string());
        assert_eq!(ctx.system_prompt(10).unwrap(), "Explain this in French.");
    }
}
