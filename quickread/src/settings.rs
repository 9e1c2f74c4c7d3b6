//! User settings: API key, model, language, default actions and custom prompts.
//!
//! Sources, lowest priority first: built-in defaults, the `[settings]` table of
//! `$XDG_CONFIG_HOME/quickread/config.toml`, then `QUICKREAD_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::task::ActionType;

/// App name used for the XDG config directory.
pub const APP_NAME: &str = "quickread";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("config: {0}")]
    Load(#[from] env_config::LoadError),
    #[error("invalid value for {var}: {value:?} ({message})")]
    InvalidValue {
        var: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    /// Model alias; `"zz"` selects `user_model_id`.
    pub language_model: String,
    pub user_model_id: String,
    /// Target language code; `"zz"` selects `user_language`.
    pub language_code: String,
    pub user_language: String,
    /// Action for a page without a selection.
    pub no_text_action: ActionType,
    /// Action for a selected text.
    pub text_action: ActionType,
    pub streaming: bool,
    pub text_custom_prompt: Option<String>,
    pub no_text_custom_prompt: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language_model: "2.0-flash".to_string(),
            user_model_id: "gemini-2.0-flash-001".to_string(),
            language_code: "en".to_string(),
            user_language: "Turkish".to_string(),
            no_text_action: ActionType::Summarize,
            text_action: ActionType::Translate,
            streaming: false,
            text_custom_prompt: None,
            no_text_custom_prompt: None,
        }
    }
}

/// The settings that change what the backend would answer. Streaming is not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFingerprint {
    api_key: String,
    language_model: String,
    user_model_id: String,
    language_code: String,
    user_language: String,
    text_custom_prompt: Option<String>,
    no_text_custom_prompt: Option<String>,
}

impl Settings {
    /// XDG `[settings]` table with `QUICKREAD_*` env overrides applied.
    pub fn from_env() -> Result<Self, SettingsError> {
        let base: Settings = env_config::load_settings(APP_NAME)?;
        base.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides looked up by env var name. Empty values are ignored.
    pub fn with_overrides<F>(mut self, get: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| get(var).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("QUICKREAD_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.api_key = key.trim().to_string();
        }
        for (var, field) in [
            ("QUICKREAD_LANGUAGE_MODEL", &mut self.language_model),
            ("QUICKREAD_USER_MODEL_ID", &mut self.user_model_id),
            ("QUICKREAD_LANGUAGE_CODE", &mut self.language_code),
            ("QUICKREAD_USER_LANGUAGE", &mut self.user_language),
        ] {
            if let Some(v) = lookup(var) {
                *field = v.trim().to_string();
            }
        }
        for (var, field) in [
            ("QUICKREAD_NO_TEXT_ACTION", &mut self.no_text_action),
            ("QUICKREAD_TEXT_ACTION", &mut self.text_action),
        ] {
            if let Some(v) = lookup(var) {
                *field = v.parse().map_err(|e: model_spec_core::ParseActionError| {
                    SettingsError::InvalidValue {
                        var,
                        value: v.clone(),
                        message: e.to_string(),
                    }
                })?;
            }
        }
        if let Some(v) = lookup("QUICKREAD_STREAMING") {
            self.streaming = parse_bool(&v).ok_or_else(|| SettingsError::InvalidValue {
                var: "QUICKREAD_STREAMING",
                value: v.clone(),
                message: "expected true/false".to_string(),
            })?;
        }
        Ok(self)
    }

    /// Default action: `text_action` for a selection, `no_text_action` for a whole page.
    pub fn action_for(&self, has_selection: bool) -> ActionType {
        if has_selection {
            self.text_action
        } else {
            self.no_text_action
        }
    }

    /// Configured prompt for a custom action; `None` for built-in actions.
    pub fn custom_prompt_for(&self, action: ActionType) -> Option<&str> {
        match action {
            ActionType::TextCustom => self.text_custom_prompt.as_deref(),
            ActionType::NoTextCustom => self.no_text_custom_prompt.as_deref(),
            ActionType::Summarize | ActionType::Translate => None,
        }
    }

    pub fn fingerprint(&self) -> SettingsFingerprint {
        SettingsFingerprint {
            api_key: self.api_key.clone(),
            language_model: self.language_model.clone(),
            user_model_id: self.user_model_id.clone(),
            language_code: self.language_code.clone(),
            user_language: self.user_language.clone(),
            text_custom_prompt: self.text_custom_prompt.clone(),
            no_text_custom_prompt: self.no_text_custom_prompt.clone(),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
