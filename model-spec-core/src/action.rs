//! Action type requested by the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the model is asked to do with the input.
///
/// The two custom variants distinguish a custom prompt applied to a whole page
/// (`NoTextCustom`, no selection) from one applied to a selected text (`TextCustom`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Summarize,
    Translate,
    NoTextCustom,
    TextCustom,
}

impl ActionType {
    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Summarize => "summarize",
            ActionType::Translate => "translate",
            ActionType::NoTextCustom => "noTextCustom",
            ActionType::TextCustom => "textCustom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ActionType::NoTextCustom | ActionType::TextCustom)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`ActionType::from_str`] for an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown action: {} (use summarize, translate, noTextCustom or textCustom)",
            self.0
        )
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for ActionType {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "summarize" => Ok(Self::Summarize),
            "translate" => Ok(Self::Translate),
            "notextcustom" => Ok(Self::NoTextCustom),
            "textcustom" | "custom" => Ok(Self::TextCustom),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}
