//! Token limits and the character budgets derived from them.

use serde::{Deserialize, Serialize};

use crate::action::ActionType;

/// Character budget used for every action when nothing better is known.
pub const DEFAULT_CHARACTER_LIMIT: usize = 8192;

/// Token limits as reported by the model metadata endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLimits {
    pub input_token_limit: u64,
    pub output_token_limit: u64,
}

impl TokenLimits {
    pub fn new(input_token_limit: u64, output_token_limit: u64) -> Self {
        Self {
            input_token_limit,
            output_token_limit,
        }
    }

    /// Character budgets for each action.
    ///
    /// Summaries and custom prompts may use three quarters of the input token
    /// limit (roughly one token per 4/3 characters). Translations produce about as
    /// much text as they read, so they are bounded by the output token limit.
    pub fn to_character_limits(&self) -> CharacterLimits {
        let input_chars = (self.input_token_limit.saturating_mul(3) / 4) as usize;
        CharacterLimits {
            summarize: input_chars,
            translate: self.output_token_limit as usize,
            no_text_custom: input_chars,
            text_custom: input_chars,
        }
    }
}

/// Maximum input size, in characters, per action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterLimits {
    pub summarize: usize,
    pub translate: usize,
    pub no_text_custom: usize,
    pub text_custom: usize,
}

impl CharacterLimits {
    /// Same budget for every action.
    pub const fn uniform(limit: usize) -> Self {
        Self {
            summarize: limit,
            translate: limit,
            no_text_custom: limit,
            text_custom: limit,
        }
    }

    /// Table row shape: one budget for reading-heavy actions, one for translation.
    pub const fn split(input: usize, translate: usize) -> Self {
        Self {
            summarize: input,
            translate,
            no_text_custom: input,
            text_custom: input,
        }
    }

    pub fn for_action(&self, action: ActionType) -> usize {
        match action {
            ActionType::Summarize => self.summarize,
            ActionType::Translate => self.translate,
            ActionType::NoTextCustom => self.no_text_custom,
            ActionType::TextCustom => self.text_custom,
        }
    }

    /// True when any budget is zero (unusable for chunking).
    pub fn has_zero(&self) -> bool {
        self.summarize == 0 || self.translate == 0 || self.no_text_custom == 0 || self.text_custom == 0
    }
}

impl Default for CharacterLimits {
    fn default() -> Self {
        Self::uniform(DEFAULT_CHARACTER_LIMIT)
    }
}
